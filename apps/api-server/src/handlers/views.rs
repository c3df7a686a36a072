//! Domain → wire conversions.

use pressroom_core::domain::{
    Category, Comment, DraftChanges, NewPost, Post, PostChanges, PostStatus, User,
};
use pressroom_shared::dto::{
    CategoryResponse, CommentResponse, CreatePostRequest, PostResponse, UpdateDraftRequest,
    UpdatePostRequest, UserResponse,
};

use crate::middleware::error::AppResult;

pub fn post(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        category_id: post.category_id,
        title: post.title,
        content: post.content,
        tags: post.tags,
        media: post.media,
        status: post.status.as_str().to_string(),
        published: post.published,
        publish_at: post.publish_at,
        likes: post.reactions.likes,
        liked_by: post.reactions.liked_by,
        comments: post.comments.into_iter().map(comment).collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn posts(posts: Vec<Post>) -> Vec<PostResponse> {
    posts.into_iter().map(post).collect()
}

fn comment(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        author_id: comment.author_id,
        content: comment.content,
        likes: comment.reactions.likes,
        liked_by: comment.reactions.liked_by,
        created_at: comment.created_at,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name,
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

pub fn user(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role.as_str().to_string(),
        created_at: user.created_at,
    }
}

fn status(raw: Option<String>) -> AppResult<Option<PostStatus>> {
    Ok(raw.as_deref().map(str::parse::<PostStatus>).transpose()?)
}

pub fn new_post(req: CreatePostRequest) -> AppResult<NewPost> {
    Ok(NewPost {
        title: req.title,
        content: req.content,
        tags: req.tags,
        media: req.media,
        status: status(req.status)?,
        publish_at: req.publish_at,
    })
}

pub fn post_changes(req: UpdatePostRequest) -> PostChanges {
    PostChanges {
        title: req.title,
        content: req.content,
        tags: req.tags,
        media: req.media,
    }
}

pub fn draft_changes(req: UpdateDraftRequest) -> AppResult<DraftChanges> {
    Ok(DraftChanges {
        status: status(req.status)?,
        publish_at: req.publish_at,
        content: PostChanges {
            title: req.title,
            content: req.content,
            tags: req.tags,
            media: req.media,
        },
    })
}
