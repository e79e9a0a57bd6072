use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PostError {
    #[error("Post already liked")]
    AlreadyLiked,
    #[error("Post has not yet been liked")]
    NotLiked,
    #[error("Comment does not exist")]
    CommentNotFound,
    #[error("User not authorized")]
    NotOwner,
}

/// Name and avatar copied from the user at write time; never re-synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Post {
    pub fn new(author: &Author, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: author.id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|l| l.user == user_id)
    }

    pub fn like(&mut self, user_id: Uuid) -> Result<(), PostError> {
        if self.is_liked_by(user_id) {
            return Err(PostError::AlreadyLiked);
        }
        self.likes.insert(
            0,
            Like {
                id: Uuid::new_v4(),
                user: user_id,
            },
        );
        Ok(())
    }

    pub fn unlike(&mut self, user_id: Uuid) -> Result<(), PostError> {
        let pos = self
            .likes
            .iter()
            .position(|l| l.user == user_id)
            .ok_or(PostError::NotLiked)?;
        self.likes.remove(pos);
        Ok(())
    }

    pub fn add_comment(&mut self, author: &Author, text: String) -> Uuid {
        let id = Uuid::new_v4();
        self.comments.insert(
            0,
            Comment {
                id,
                user: author.id,
                text,
                name: author.name.clone(),
                avatar: author.avatar.clone(),
                created_at: OffsetDateTime::now_utc(),
            },
        );
        id
    }

    /// Only the comment's author may remove it.
    pub fn remove_comment(&mut self, comment_id: Uuid, user_id: Uuid) -> Result<Comment, PostError> {
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or(PostError::CommentNotFound)?;
        if self.comments[pos].user != user_id {
            return Err(PostError::NotOwner);
        }
        Ok(self.comments.remove(pos))
    }

    pub fn ensure_owner(&self, user_id: Uuid) -> Result<(), PostError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(PostError::NotOwner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str) -> Author {
        Author {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: format!("https://www.gravatar.com/avatar/{name}"),
        }
    }

    #[test]
    fn new_post_snapshots_author() {
        let a = author("alice");
        let post = Post::new(&a, "hello".into());
        assert_eq!(post.user_id, a.id);
        assert_eq!(post.name, "alice");
        assert_eq!(post.avatar, a.avatar);
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn second_like_by_same_user_is_rejected() {
        let mut post = Post::new(&author("alice"), "hello".into());
        let bob = Uuid::new_v4();
        post.like(bob).unwrap();
        assert_eq!(post.like(bob), Err(PostError::AlreadyLiked));
        assert_eq!(post.likes.len(), 1);
    }

    #[test]
    fn likes_are_prepended() {
        let mut post = Post::new(&author("alice"), "hello".into());
        let (bob, carol) = (Uuid::new_v4(), Uuid::new_v4());
        post.like(bob).unwrap();
        post.like(carol).unwrap();
        assert_eq!(post.likes[0].user, carol);
        assert_eq!(post.likes[1].user, bob);
    }

    #[test]
    fn unlike_restores_like_count_and_removes_the_right_entry() {
        let mut post = Post::new(&author("alice"), "hello".into());
        let (bob, carol) = (Uuid::new_v4(), Uuid::new_v4());
        post.like(bob).unwrap();
        let before = post.likes.len();
        post.like(carol).unwrap();
        post.unlike(carol).unwrap();
        assert_eq!(post.likes.len(), before);
        assert!(post.is_liked_by(bob));
        assert!(!post.is_liked_by(carol));
    }

    #[test]
    fn unlike_without_like_fails() {
        let mut post = Post::new(&author("alice"), "hello".into());
        assert_eq!(post.unlike(Uuid::new_v4()), Err(PostError::NotLiked));
    }

    #[test]
    fn comments_are_prepended_with_author_snapshot() {
        let mut post = Post::new(&author("alice"), "hello".into());
        let bob = author("bob");
        post.add_comment(&bob, "first".into());
        post.add_comment(&bob, "second".into());
        assert_eq!(post.comments[0].text, "second");
        assert_eq!(post.comments[0].name, "bob");
        assert_eq!(post.comments[0].user, bob.id);
    }

    #[test]
    fn remove_comment_checks_existence_then_authorship() {
        let mut post = Post::new(&author("alice"), "hello".into());
        let bob = author("bob");
        let carol = author("carol");
        let bobs = post.add_comment(&bob, "from bob".into());
        let carols = post.add_comment(&carol, "from carol".into());

        assert_eq!(
            post.remove_comment(Uuid::new_v4(), bob.id),
            Err(PostError::CommentNotFound)
        );
        assert_eq!(post.remove_comment(bobs, carol.id), Err(PostError::NotOwner));
        assert_eq!(post.comments.len(), 2);

        // bob's comment is not the first one, removal must still hit it
        let removed = post.remove_comment(bobs, bob.id).unwrap();
        assert_eq!(removed.text, "from bob");
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].id, carols);
    }

    #[test]
    fn only_author_owns_post() {
        let a = author("alice");
        let post = Post::new(&a, "hello".into());
        assert!(post.ensure_owner(a.id).is_ok());
        assert_eq!(post.ensure_owner(Uuid::new_v4()), Err(PostError::NotOwner));
    }

    #[test]
    fn post_serializes_with_frontend_field_names() {
        let post = Post::new(&author("alice"), "hello".into());
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["_id"], post.id.to_string());
        assert_eq!(json["user"], post.user_id.to_string());
        assert!(json["date"].is_string());
    }
}
