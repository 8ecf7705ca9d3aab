//! Baseline accounts and welcome content.
//!
//! [`ensure_baseline`] is safe to run on every start: accounts are only
//! created when their username is free, and the sample posts are only written
//! the first time the admin account is created.

use chrono::Utc;

use crate::{
    auth::AuthService,
    domain::{GradeLevel, NewPost, NewUser, PostType, Role},
    error::Result,
    repository::{PostRepository, UserRepository},
};

struct SeedUser {
    username: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    grade_level: GradeLevel,
    first_name: &'static str,
    last_name: &'static str,
}

const ADMIN: SeedUser = SeedUser {
    username: "admin",
    email: "admin@school.edu",
    password: "admin123",
    role: Role::Admin,
    grade_level: GradeLevel::Senior,
    first_name: "System",
    last_name: "Administrator",
};

const SAMPLE_USERS: [SeedUser; 4] = [
    SeedUser {
        username: "teacher_lang",
        email: "lang.teacher@school.edu",
        password: "teacher123",
        role: Role::LanguageTeacher,
        grade_level: GradeLevel::Senior,
        first_name: "Sarah",
        last_name: "Johnson",
    },
    SeedUser {
        username: "teacher_math",
        email: "math.teacher@school.edu",
        password: "teacher123",
        role: Role::Teacher,
        grade_level: GradeLevel::Middle,
        first_name: "Mike",
        last_name: "Davis",
    },
    SeedUser {
        username: "student1",
        email: "student1@school.edu",
        password: "student123",
        role: Role::Student,
        grade_level: GradeLevel::Senior,
        first_name: "Emma",
        last_name: "Wilson",
    },
    SeedUser {
        username: "parent1",
        email: "parent1@school.edu",
        password: "parent123",
        role: Role::Parent,
        grade_level: GradeLevel::Junior,
        first_name: "Robert",
        last_name: "Brown",
    },
];

const SAMPLE_POSTS: [(PostType, &str, &str); 3] = [
    (
        PostType::PrincipalNote,
        "Welcome to the New School Year!",
        "Dear students, parents, and faculty,\n\nWelcome to another exciting school year! \
         We are thrilled to have you all back and look forward to a year filled with learning, \
         growth, and achievement.\n\nThis year, we have implemented several new programs and \
         initiatives designed to enhance your educational experience. Please stay tuned for \
         more updates and announcements.\n\nBest regards,\nDr. Principal",
    ),
    (
        PostType::Announcement,
        "Parent-Teacher Conference Schedule",
        "Parent-teacher conferences will be held next week from October 15-19. Please check \
         your email for your scheduled appointment time. If you need to reschedule, please \
         contact the main office.",
    ),
    (
        PostType::Reminder,
        "Library Books Due",
        "Reminder: All library books are due by Friday, October 12th. Please return them to \
         avoid late fees.",
    ),
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: Vec<String>,
    pub posts_created: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.users_created.is_empty() && self.posts_created == 0
    }
}

pub async fn ensure_baseline(
    users: &dyn UserRepository,
    posts: &dyn PostRepository,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if users.find_by_username(ADMIN.username).await?.is_some() {
        tracing::debug!("Baseline accounts already present");
        return Ok(report);
    }

    let admin = create_user(users, &ADMIN).await?;
    report.users_created.push(admin.username.clone());

    for seed in &SAMPLE_USERS {
        if users.find_by_username(seed.username).await?.is_none() {
            let user = create_user(users, seed).await?;
            report.users_created.push(user.username);
        }
    }

    for (post_type, title, content) in SAMPLE_POSTS {
        posts.create(NewPost {
            title: title.to_string(),
            content: content.to_string(),
            post_type,
            grade_level: GradeLevel::All,
            author_id: admin.id,
            created_at: Utc::now(),
        }).await?;
        report.posts_created += 1;
    }

    tracing::info!(
        users = ?report.users_created,
        posts = report.posts_created,
        "Baseline accounts and sample content created"
    );

    Ok(report)
}

async fn create_user(users: &dyn UserRepository, seed: &SeedUser) -> Result<crate::domain::User> {
    let password_hash = AuthService::hash_password(seed.password).await?;
    users.create(NewUser {
        username: seed.username.to_string(),
        email: seed.email.to_string(),
        password_hash,
        role: seed.role,
        grade_level: seed.grade_level,
        first_name: seed.first_name.to_string(),
        last_name: seed.last_name.to_string(),
    }).await
}
