//! Authorization rules for forum actions.
//!
//! Everything here is pure: the same actor, action and toggles always give the
//! same answer, and nothing touches the database. Services call
//! [`Policy::authorize`] before mutating anything.

use crate::{
    config::ForumConfig,
    domain::{GradeLevel, Post, Role, User},
    error::{AppError, Result},
};

/// The identity a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
    pub grade_level: GradeLevel,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            grade_level: user.grade_level,
        }
    }
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreatePost,
    EditPost(&'a Post),
    DeletePost(&'a Post),
    Vote(&'a Post),
    ViewPost(&'a Post),
    ViewMonthlyWinner,
    ManageUsers,
}

#[derive(Debug, Clone, Default)]
pub struct Policy {
    allow_student_posts: bool,
    allow_parent_posts: bool,
    allow_self_vote: bool,
}

impl From<&ForumConfig> for Policy {
    fn from(config: &ForumConfig) -> Self {
        Self {
            allow_student_posts: config.allow_student_posts,
            allow_parent_posts: config.allow_parent_posts,
            allow_self_vote: config.allow_self_vote,
        }
    }
}

impl Policy {
    pub fn can_perform(&self, actor: &Actor, action: Action<'_>) -> bool {
        match action {
            Action::CreatePost => match actor.role {
                Role::Admin | Role::Teacher | Role::LanguageTeacher => true,
                Role::Student => self.allow_student_posts,
                Role::Parent => self.allow_parent_posts,
            },
            Action::EditPost(post) | Action::DeletePost(post) => {
                actor.is_admin() || actor.id == post.author_id
            }
            Action::Vote(post) => self.allow_self_vote || actor.id != post.author_id,
            Action::ViewPost(post) => {
                actor.is_admin()
                    || post.grade_level == GradeLevel::All
                    || post.grade_level == actor.grade_level
            }
            Action::ViewMonthlyWinner | Action::ManageUsers => actor.is_admin(),
        }
    }

    pub fn authorize(&self, actor: &Actor, action: Action<'_>) -> Result<()> {
        if self.can_perform(actor, action) {
            Ok(())
        } else {
            tracing::debug!(actor_id = actor.id, role = %actor.role, ?action, "Authorization denied");
            Err(AppError::Forbidden)
        }
    }

    /// Grade levels whose posts the actor may see, or `None` for no restriction.
    /// Must agree with [`Action::ViewPost`].
    pub fn visible_grades(&self, actor: &Actor) -> Option<Vec<GradeLevel>> {
        if actor.is_admin() {
            return None;
        }
        if actor.grade_level == GradeLevel::All {
            Some(vec![GradeLevel::All])
        } else {
            Some(vec![GradeLevel::All, actor.grade_level])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostType;
    use chrono::Utc;

    fn actor(id: i64, role: Role, grade_level: GradeLevel) -> Actor {
        Actor { id, role, grade_level }
    }

    fn post(author_id: i64, grade_level: GradeLevel) -> Post {
        Post {
            id: 1,
            title: "Title".to_string(),
            content: "Body".to_string(),
            post_type: PostType::Announcement,
            grade_level,
            author_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    const ROLES: [Role; 5] = [
        Role::Admin,
        Role::Teacher,
        Role::LanguageTeacher,
        Role::Student,
        Role::Parent,
    ];

    const GRADES: [GradeLevel; 4] = [
        GradeLevel::Junior,
        GradeLevel::Middle,
        GradeLevel::Senior,
        GradeLevel::All,
    ];

    #[test]
    fn staff_can_create_posts_but_students_and_parents_cannot() {
        let policy = Policy::default();
        assert!(policy.can_perform(&actor(1, Role::Admin, GradeLevel::All), Action::CreatePost));
        assert!(policy.can_perform(&actor(1, Role::Teacher, GradeLevel::Middle), Action::CreatePost));
        assert!(policy.can_perform(&actor(1, Role::LanguageTeacher, GradeLevel::Senior), Action::CreatePost));
        assert!(!policy.can_perform(&actor(1, Role::Student, GradeLevel::Senior), Action::CreatePost));
        assert!(!policy.can_perform(&actor(1, Role::Parent, GradeLevel::Junior), Action::CreatePost));
    }

    #[test]
    fn toggles_open_posting_to_students_and_parents() {
        let policy = Policy::from(&ForumConfig {
            allow_student_posts: true,
            allow_parent_posts: true,
            ..ForumConfig::default()
        });
        assert!(policy.can_perform(&actor(1, Role::Student, GradeLevel::Senior), Action::CreatePost));
        assert!(policy.can_perform(&actor(1, Role::Parent, GradeLevel::Junior), Action::CreatePost));
    }

    #[test]
    fn only_author_or_admin_may_edit_and_delete() {
        let policy = Policy::default();
        let p = post(7, GradeLevel::All);
        assert!(policy.can_perform(&actor(7, Role::Teacher, GradeLevel::Middle), Action::EditPost(&p)));
        assert!(policy.can_perform(&actor(1, Role::Admin, GradeLevel::Senior), Action::DeletePost(&p)));
        assert!(!policy.can_perform(&actor(8, Role::Teacher, GradeLevel::Middle), Action::EditPost(&p)));
        assert!(matches!(
            policy.authorize(&actor(8, Role::Student, GradeLevel::All), Action::DeletePost(&p)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn self_vote_is_denied_unless_enabled() {
        let p = post(7, GradeLevel::All);
        let author = actor(7, Role::Teacher, GradeLevel::Middle);
        assert!(!Policy::default().can_perform(&author, Action::Vote(&p)));
        assert!(Policy::default().can_perform(&actor(9, Role::Parent, GradeLevel::Junior), Action::Vote(&p)));

        let permissive = Policy::from(&ForumConfig {
            allow_self_vote: true,
            ..ForumConfig::default()
        });
        assert!(permissive.can_perform(&author, Action::Vote(&p)));
    }

    #[test]
    fn senior_post_hidden_from_junior_student_but_not_admin() {
        let policy = Policy::default();
        let p = post(1, GradeLevel::Senior);
        assert!(!policy.can_perform(&actor(2, Role::Student, GradeLevel::Junior), Action::ViewPost(&p)));
        assert!(policy.can_perform(&actor(3, Role::Admin, GradeLevel::Junior), Action::ViewPost(&p)));
        assert!(policy.can_perform(&actor(4, Role::Student, GradeLevel::Senior), Action::ViewPost(&p)));
    }

    #[test]
    fn visible_grades_agrees_with_view_rule() {
        let policy = Policy::default();
        for role in ROLES {
            for viewer_grade in GRADES {
                let a = actor(99, role, viewer_grade);
                let visible = policy.visible_grades(&a);
                for post_grade in GRADES {
                    let p = post(1, post_grade);
                    let listed = visible
                        .as_ref()
                        .map_or(true, |grades| grades.contains(&post_grade));
                    assert_eq!(
                        listed,
                        policy.can_perform(&a, Action::ViewPost(&p)),
                        "{role} viewing {post_grade} as {viewer_grade}"
                    );
                }
            }
        }
    }

    #[test]
    fn monthly_winner_and_user_management_are_admin_only() {
        let policy = Policy::default();
        for role in ROLES {
            let a = actor(1, role, GradeLevel::All);
            assert_eq!(policy.can_perform(&a, Action::ViewMonthlyWinner), role == Role::Admin);
            assert_eq!(policy.can_perform(&a, Action::ManageUsers), role == Role::Admin);
        }
    }
}
