use utoipa::OpenApi;

use crate::routes::{
    auth, categories, chat, notifications, oauth, projects, public, skills, tasks, team, users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quasar API",
        version = "0.3.0",
        description = "Project collaboration for college students: profiles, skills, teams, tasks and chat."
    ),
    paths(
        auth::register,
        auth::login,
        auth::me,
        auth::logout,
        auth::github,
        oauth::authorize,
        oauth::callback,
        users::get_user,
        users::count_users,
        users::update_profile,
        users::update_availability,
        users::search_users,
        users::dashboard,
        users::my_skills,
        users::user_skills,
        users::add_skill,
        users::add_skills,
        users::update_skill,
        users::remove_skill,
        skills::list_skills,
        skills::search_skills,
        skills::categories,
        skills::skills_by_category,
        skills::popular_skills,
        skills::predefined_skills,
        skills::get_skill,
        skills::create_skill,
        skills::update_skill,
        skills::delete_skill,
        categories::list_categories,
        categories::search_categories,
        categories::get_category,
        categories::create_category,
        projects::create_project,
        projects::get_project,
        projects::update_project,
        projects::delete_project,
        projects::search_projects,
        projects::discover_projects,
        projects::my_projects,
        projects::led_by_me,
        projects::count_projects,
        projects::members,
        projects::add_member,
        projects::remove_member,
        projects::update_role,
        projects::leave_project,
        team::send_invitation,
        team::respond_to_invitation,
        team::cancel_invitation,
        team::received_invitations,
        team::pending_invitations,
        team::sent_invitations,
        team::project_invitations,
        team::request_to_join,
        team::project_join_requests,
        team::accept_join_request,
        team::reject_join_request,
        team::cancel_join_request,
        team::my_join_requests,
        tasks::create_task,
        tasks::list_tasks,
        tasks::search_tasks,
        tasks::overdue_tasks,
        tasks::due_today,
        tasks::due_soon,
        tasks::statistics,
        tasks::my_tasks,
        tasks::get_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::toggle_complete,
        tasks::assign_task,
        notifications::list_notifications,
        notifications::recent_notifications,
        notifications::unread_count,
        notifications::get_notification,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        notifications::delete_all,
        chat::send_message,
        chat::list_messages,
        chat::recent_messages,
        chat::search_messages,
        chat::messages_after,
        chat::latest_messages,
        chat::count_messages,
        chat::get_message,
        chat::edit_message,
        chat::delete_message,
        public::branches,
        public::years,
        public::project_categories,
        public::team_roles,
        public::skill_levels,
        public::predefined_skills,
        public::landing_counts,
        public::recent_projects,
        public::popular_skills,
        public::health,
    ),
    components(schemas(
        crate::dto::RegisterRequest,
        crate::dto::LoginRequest,
        crate::dto::AuthResponse,
        crate::dto::GitHubLoginResponse,
        crate::dto::UserResponse,
        crate::dto::UserProfileResponse,
        crate::dto::UpdateProfileRequest,
        crate::dto::DashboardResponse,
        crate::dto::SkillResponse,
        crate::dto::CreateSkillRequest,
        crate::dto::UpdateSkillRequest,
        crate::dto::PredefinedSkillResponse,
        crate::dto::UserSkillRequest,
        crate::dto::BatchUserSkillRequest,
        crate::dto::UpdateUserSkillRequest,
        crate::dto::UserSkillResponse,
        crate::dto::CategoryResponse,
        crate::dto::CreateCategoryRequest,
        crate::dto::SkillRequirementRequest,
        crate::dto::CreateProjectRequest,
        crate::dto::UpdateProjectRequest,
        crate::dto::ProjectSkillResponse,
        crate::dto::ProjectResponse,
        crate::dto::MemberResponse,
        crate::dto::AddMemberRequest,
        crate::dto::UpdateRoleRequest,
        crate::dto::InvitationRequest,
        crate::dto::InvitationResponse,
        crate::dto::JoinRequestRequest,
        crate::dto::JoinRequestResponse,
        crate::dto::CreateTaskRequest,
        crate::dto::UpdateTaskRequest,
        crate::dto::AssignTaskRequest,
        crate::dto::TaskResponse,
        crate::dto::TaskStatisticsResponse,
        crate::dto::NotificationResponse,
        crate::dto::SendMessageRequest,
        crate::dto::ChatMessageResponse,
        crate::dto::ChatEventResponse,
        crate::dto::MessageResponse,
        crate::dto::CountResponse,
        crate::dto::LandingCountsResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and the current user"),
        (name = "oauth2", description = "GitHub login"),
        (name = "users", description = "Profiles, search and profile skills"),
        (name = "skills", description = "Skill catalogue"),
        (name = "categories", description = "Project categories"),
        (name = "projects", description = "Projects and their members"),
        (name = "team", description = "Invitations and join requests"),
        (name = "tasks", description = "Project task boards"),
        (name = "notifications", description = "In-app notifications"),
        (name = "chat", description = "Project chat"),
        (name = "static-data", description = "Reference lists for forms"),
        (name = "landing", description = "Public landing page data"),
        (name = "health", description = "Liveness and database status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer JWT security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/auth/login or /api/auth/register."))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/projects/{id}",
            "/api/teams/{projectId}/invitations",
            "/api/chat/projects/{id}/messages",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
