//! Static reference data and limits shared by the API and the services.

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CHAT_PAGE_SIZE: u32 = 50;

pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 50;
pub const BIO_MAX_LENGTH: usize = 500;
pub const PROJECT_TITLE_MIN_LENGTH: usize = 5;
pub const PROJECT_TITLE_MAX_LENGTH: usize = 100;
pub const PROJECT_DESCRIPTION_MIN_LENGTH: usize = 10;
pub const PROJECT_DESCRIPTION_MAX_LENGTH: usize = 1000;
pub const PROJECT_TEXT_MAX_LENGTH: usize = 1000;
pub const PROJECT_LINK_MAX_LENGTH: usize = 200;
pub const MIN_TEAM_SIZE: i32 = 2;
pub const MAX_TEAM_SIZE: i32 = 20;
pub const MIN_GRADUATION_YEAR: i32 = 2020;
pub const MAX_GRADUATION_YEAR: i32 = 2030;
pub const SKILL_NAME_MIN_LENGTH: usize = 2;
pub const SKILL_NAME_MAX_LENGTH: usize = 100;
pub const CATEGORY_NAME_MAX_LENGTH: usize = 100;
pub const TASK_TITLE_MIN_LENGTH: usize = 3;
pub const TASK_TITLE_MAX_LENGTH: usize = 200;
pub const TASK_DESCRIPTION_MAX_LENGTH: usize = 1000;
pub const REQUEST_MESSAGE_MAX_LENGTH: usize = 500;
pub const CHAT_MESSAGE_MAX_LENGTH: usize = 1000;

pub const DEFAULT_SKILL_CATEGORY: &str = "General";
pub const DEFAULT_BRANCH: &str = "Computer Science";
pub const DEFAULT_GRADUATION_YEAR: i32 = 2027;

pub const BRANCHES: &[&str] = &[
    "Computer Science",
    "Information Technology",
    "Electronics and Communication",
    "Mechanical Engineering",
    "Civil Engineering",
    "Electrical Engineering",
    "Chemical Engineering",
    "Biotechnology",
    "Business Administration",
    "Data Science",
    "Artificial Intelligence",
    "Cybersecurity",
    "Other",
];

pub const PROJECT_CATEGORIES: &[&str] = &[
    "Web Development",
    "Mobile App Development",
    "Data Science",
    "Machine Learning",
    "Artificial Intelligence",
    "Blockchain",
    "Game Development",
    "IoT",
    "Cybersecurity",
    "Research",
    "Business",
    "Design",
    "Other",
];

pub const TEAM_ROLES: &[&str] = &[
    "Developer",
    "Designer",
    "Project Manager",
    "Tester",
    "DevOps Engineer",
    "Business Analyst",
    "Researcher",
    "Data Scientist",
    "Other",
];

/// Predefined skills as `(name, category)`, in display order.
pub const PREDEFINED_SKILLS: &[(&str, &str)] = &[
    ("Java", "Programming Language"),
    ("Python", "Programming Language"),
    ("JavaScript", "Programming Language"),
    ("C++", "Programming Language"),
    ("C#", "Programming Language"),
    ("Ruby", "Programming Language"),
    ("Swift", "Programming Language"),
    ("Kotlin", "Programming Language"),
    ("HTML", "Markup"),
    ("CSS", "Style Sheet"),
    ("React", "Frontend Framework"),
    ("Angular", "Frontend Framework"),
    ("Vue.js", "Frontend Framework"),
    ("Node.js", "Runtime / Backend"),
    ("Django", "Framework"),
    ("Flask", "Framework"),
    ("Spring Boot", "Framework"),
    ("TensorFlow", "Machine Learning"),
    ("PyTorch", "Machine Learning"),
    ("Machine Learning", "Topic"),
    ("Data Analysis", "Topic"),
    ("SQL", "Database"),
    ("NoSQL", "Database"),
    ("AWS", "Cloud"),
    ("Azure", "Cloud"),
    ("Docker", "DevOps Tool"),
    ("Kubernetes", "DevOps Tool"),
    ("Git", "Tool"),
    ("UI/UX Design", "Design"),
    ("Project Management", "Management"),
];

/// Category of a predefined skill, matched case-insensitively.
pub fn predefined_skill_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PREDEFINED_SKILLS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, c)| *c)
}

pub fn graduation_years() -> Vec<i32> {
    (MIN_GRADUATION_YEAR..=MAX_GRADUATION_YEAR).collect()
}

/// User-facing error messages.
pub mod messages {
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const PROJECT_NOT_FOUND: &str = "Project not found";
    pub const SKILL_NOT_FOUND: &str = "Skill not found";
    pub const CATEGORY_NOT_FOUND: &str = "Project category not found";
    pub const MEMBER_NOT_FOUND: &str = "Project member not found";
    pub const INVITATION_NOT_FOUND: &str = "Invitation not found";
    pub const JOIN_REQUEST_NOT_FOUND: &str = "Join request not found";
    pub const TASK_NOT_FOUND: &str = "Task not found";
    pub const NOTIFICATION_NOT_FOUND: &str = "Notification not found";
    pub const MESSAGE_NOT_FOUND: &str = "Message not found";
    pub const USER_SKILL_NOT_FOUND: &str = "User skill not found";
    pub const EMAIL_ALREADY_EXISTS: &str = "Email already exists";
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    pub const PROJECT_FULL: &str = "Project team is full";
    pub const ALREADY_MEMBER: &str = "User is already a member of this project";
    pub const INVITATION_ALREADY_SENT: &str = "Invitation already sent to this user";
    pub const JOIN_REQUEST_ALREADY_SENT: &str = "You already have a pending request for this project";
    pub const NOT_RECRUITING: &str = "Project is not recruiting new members";
    pub const GITHUB_EMAIL_MISSING: &str = "Email not found from GitHub. Make sure 'user:email' scope is requested or user has a public/primary email.";
}
