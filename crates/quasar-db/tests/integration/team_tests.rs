use chrono::{TimeDelta, Utc};

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::project::{ProjectRole, ProjectStatus};
use quasar_core::team::{InvitationStatus, NewInvitation};
use quasar_core::traits::{ProjectStore, TeamStore};
use quasar_core::user::User;
use uuid::Uuid;

use crate::integration::common::{create_project, create_user, project_for, setup_test_db};

fn invitation(project_id: Uuid, lead: &User, invitee: &User, hours: i64) -> NewInvitation {
    NewInvitation {
        project_id,
        invited_user_id: invitee.id,
        invited_by_id: lead.id,
        role: ProjectRole::Member,
        message: Some("Join us".into()),
        expires_at: Utc::now() + TimeDelta::hours(hours),
    }
}

#[tokio::test]
async fn invitation_carries_display_names() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let invitee = create_user(&db, "invitee@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;

    let created = db
        .team()
        .create_invitation(&invitation(project.id, &lead, &invitee, 24))
        .await
        .unwrap();

    assert_eq!(created.status, InvitationStatus::Pending);
    assert_eq!(created.project_title, "Campus Connect");
    assert_eq!(created.invited_user_name, invitee.full_name());
    assert_eq!(created.invited_by_name, lead.full_name());
}

#[tokio::test]
async fn second_pending_invitation_is_a_conflict() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let invitee = create_user(&db, "invitee@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let team = db.team();

    let first = team
        .create_invitation(&invitation(project.id, &lead, &invitee, 24))
        .await
        .unwrap();
    let err = team
        .create_invitation(&invitation(project.id, &lead, &invitee, 24))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Resolving the first frees the slot.
    team.resolve_invitation(first.id, InvitationStatus::Rejected)
        .await
        .unwrap();
    team.create_invitation(&invitation(project.id, &lead, &invitee, 24))
        .await
        .unwrap();
}

#[tokio::test]
async fn accept_invitation_adds_member_once() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let invitee = create_user(&db, "invitee@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let team = db.team();
    let invite = team
        .create_invitation(&invitation(project.id, &lead, &invitee, 24))
        .await
        .unwrap();

    let member = team.accept_invitation(invite.id).await.unwrap();
    assert_eq!(member.user_id, invitee.id);
    assert_eq!(member.role, ProjectRole::Member);

    let stored = team.find_invitation(invite.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Accepted);
    assert!(stored.responded_at.is_some());

    let err = team.accept_invitation(invite.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(db.projects().project_members(project.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn expire_invitations_only_touches_overdue_pending() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let late = create_user(&db, "late@college.edu").await;
    let fresh = create_user(&db, "fresh@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let team = db.team();
    let overdue = team
        .create_invitation(&invitation(project.id, &lead, &late, -1))
        .await
        .unwrap();
    team.create_invitation(&invitation(project.id, &lead, &fresh, 24))
        .await
        .unwrap();

    assert_eq!(team.expire_invitations(Utc::now()).await.unwrap(), 1);
    assert_eq!(team.expire_invitations(Utc::now()).await.unwrap(), 0);

    let stored = team.find_invitation(overdue.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Expired);
    let pending = team
        .received_invitations(fresh.id, Some(InvitationStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(team.sent_invitations(lead.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn join_request_accept_and_listing() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let student = create_user(&db, "student@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let team = db.team();

    let request = team
        .create_join_request(project.id, student.id, Some("I know Rust"))
        .await
        .unwrap();
    assert_eq!(request.user_name, student.full_name());

    let err = team
        .create_join_request(project.id, student.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let member = team.accept_join_request(request.id).await.unwrap();
    assert_eq!(member.role, ProjectRole::Member);
    assert!(team
        .find_pending_join_request(project.id, student.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(team.project_join_requests(project.id).await.unwrap().len(), 1);

    team.delete_join_request(request.id).await.unwrap();
    assert!(team.user_join_requests(student.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_accepts_cannot_overfill_the_team() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let first = create_user(&db, "first@college.edu").await;
    let second = create_user(&db, "second@college.edu").await;
    let project = db
        .projects()
        .insert_project(&project_for(&lead, "Campus Connect", 2, &[]))
        .await
        .unwrap();
    let team = db.team();
    let a = team.create_join_request(project.id, first.id, None).await.unwrap();
    let b = team.create_join_request(project.id, second.id, None).await.unwrap();

    let (ra, rb) = tokio::join!(team.accept_join_request(a.id), team.accept_join_request(b.id));
    let accepted = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    let refused = if ra.is_err() { ra } else { rb };
    assert!(matches!(refused, Err(AppError::Conflict(ref m)) if m == messages::PROJECT_FULL));
    assert_eq!(db.projects().project_members(project.id).await.unwrap().len(), 2);

    // The losing request stays pending.
    let requests = team.project_join_requests(project.id).await.unwrap();
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.status == InvitationStatus::Pending)
            .count(),
        1
    );
}

#[tokio::test]
async fn full_or_closed_project_refuses_new_members() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let invitee = create_user(&db, "invitee@college.edu").await;
    let late = create_user(&db, "late@college.edu").await;
    let projects = db.projects();
    let project = projects
        .insert_project(&project_for(&lead, "Campus Connect", 2, &[]))
        .await
        .unwrap();
    let invite = db
        .team()
        .create_invitation(&invitation(project.id, &lead, &invitee, 24))
        .await
        .unwrap();

    projects
        .add_member(project.id, late.id, ProjectRole::Member)
        .await
        .unwrap();
    let err = db.team().accept_invitation(invite.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == messages::PROJECT_FULL));
    let stored = db.team().find_invitation(invite.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Pending);

    let mut closed = projects.find_project(project.id).await.unwrap().unwrap();
    closed.status = ProjectStatus::InProgress;
    closed.max_team_size = 5;
    projects.update_project(&closed).await.unwrap();
    let err = projects
        .add_member(project.id, invitee.id, ProjectRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == messages::NOT_RECRUITING));
}
