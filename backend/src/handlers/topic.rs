//! Topic and comment handlers, mounted under `/posts`.

use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        auth::{MessageResponse, UserIdentity},
        topic::{Comment, CommentUpdate, NewTopic, Topic, TopicDetail, TopicPage, TopicUpdate},
        PageQuery,
    },
    state::AppState,
    utils::slug::generate_slug,
};

use super::uploads::{next_field, object_path_from_url, read_image_field, ImageUpload};

const POST_IMAGE_BUCKET: &str = "post-images";
const MAX_TITLE_LEN: usize = 200;
const MAX_IMAGES_PER_POST: usize = 4;

struct PostForm {
    fields: std::collections::HashMap<String, String>,
    images: Vec<ImageUpload>,
}

async fn read_post_form(multipart: &mut Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm {
        fields: std::collections::HashMap::new(),
        images: Vec::new(),
    };
    while let Some(field) = next_field(multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "images" || name == "image" {
            if form.images.len() >= MAX_IMAGES_PER_POST {
                return Err(AppError::BadRequest(format!(
                    "At most {MAX_IMAGES_PER_POST} images per post."
                )));
            }
            form.images.push(read_image_field(field).await?);
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| AppError::BadRequest(format!("Failed to read field: {err}")))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

fn required_field<'a>(form: &'a PostForm, name: &str) -> Result<&'a str, AppError> {
    form.fields
        .get(name)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Field '{name}' is required.")))
}

/// Uploads post images and returns their public URLs.
async fn store_images(
    state: &AppState,
    prefix: &str,
    images: Vec<ImageUpload>,
) -> Result<Vec<String>, AppError> {
    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        let path = format!("{prefix}/{}.{}", Uuid::new_v4(), image.extension);
        state
            .storage
            .upload(
                POST_IMAGE_BUCKET,
                &path,
                image.bytes,
                &image.content_type,
                false,
            )
            .await
            .map_err(|err| AppError::Storage(err.into()))?;
        urls.push(state.storage.public_url(POST_IMAGE_BUCKET, &path));
    }
    Ok(urls)
}

fn remove_stored_images(state: &AppState, urls: Vec<String>) {
    let storage = state.storage.clone();
    // Object removal happens off the request path; failures only warn.
    tokio::spawn(async move {
        for url in urls {
            let Some(path) = object_path_from_url(&url, POST_IMAGE_BUCKET) else {
                continue;
            };
            if let Err(err) = storage.remove(POST_IMAGE_BUCKET, &path).await {
                tracing::warn!("Failed to remove stored image {url}: {:?}", err);
            }
        }
    });
}

pub async fn create_topic(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Topic>), AppError> {
    let form = read_post_form(&mut multipart).await?;
    let title = required_field(&form, "title")?;
    let content = required_field(&form, "content")?;
    let category = required_field(&form, "category")?;

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "Title must be at most {MAX_TITLE_LEN} characters."
        )));
    }
    if !state.store.category_exists(category).await? {
        return Err(AppError::NotFound("Category not found.".to_string()));
    }
    if !state.store.can_create_topic(identity.id, category).await? {
        return Err(AppError::Forbidden(
            "You are not allowed to create topics in this category.".to_string(),
        ));
    }

    let new_topic = NewTopic {
        title: title.to_string(),
        content: content.to_string(),
        author_id: identity.id,
        category: category.to_string(),
        slug: generate_slug(title),
    };
    let topic = state.store.insert_topic(&new_topic).await?;

    if !form.images.is_empty() {
        let prefix = format!("topics/{}", topic.id);
        let urls = store_images(&state, &prefix, form.images).await?;
        state
            .store
            .attach_topic_images(topic.id, identity.id, &urls)
            .await?;
    }

    Ok((StatusCode::CREATED, Json(topic)))
}

/// Loads one comment page onto the topic detail.
async fn assemble_topic_page(
    state: &AppState,
    mut detail: TopicDetail,
    page: PageQuery,
) -> Result<TopicPage, AppError> {
    let total_comments = state.store.count_comments_for_topic(detail.id).await?;
    detail.comments = state
        .store
        .comments_for_topic(detail.id, page.offset(), page.limit())
        .await?;
    Ok(TopicPage {
        data: detail,
        total_comments,
    })
}

pub async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<Json<TopicPage>, AppError> {
    let detail = state
        .store
        .topic_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found.".to_string()))?;
    Ok(Json(assemble_topic_page(&state, detail, page).await?))
}

pub async fn get_topic_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<TopicPage>, AppError> {
    let detail = state
        .store
        .topic_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found.".to_string()))?;
    Ok(Json(assemble_topic_page(&state, detail, page).await?))
}

pub async fn update_topic(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<TopicUpdate>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update.".to_string()));
    }
    // The author filter rides the update itself; zero matched rows means the
    // topic is missing or owned by someone else.
    let matched = state.store.update_topic(id, identity.id, &payload).await?;
    if !matched {
        return Err(AppError::Forbidden(
            "You can only edit your own topics.".to_string(),
        ));
    }
    Ok(Json(MessageResponse::new("Topic updated successfully.")))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let image_urls = state.store.topic_image_urls(id).await?;
    let deleted = state.store.delete_topic(id, identity.id).await?;
    if deleted == 0 {
        return Err(AppError::Forbidden(
            "You can only delete your own topics.".to_string(),
        ));
    }
    remove_stored_images(&state, image_urls);
    Ok(Json(MessageResponse::new("Topic deleted successfully.")))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(topic_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let form = read_post_form(&mut multipart).await?;
    let content = required_field(&form, "content")?;

    if state.store.topic_by_id(topic_id).await?.is_none() {
        return Err(AppError::NotFound("Topic not found.".to_string()));
    }
    if !state
        .store
        .can_create_comment(identity.id, topic_id)
        .await?
    {
        return Err(AppError::Forbidden(
            "You are not allowed to comment on this topic.".to_string(),
        ));
    }

    let comment_id = state
        .store
        .insert_comment(topic_id, identity.id, content)
        .await?;

    if !form.images.is_empty() {
        let prefix = format!("comments/{comment_id}");
        let urls = store_images(&state, &prefix, form.images).await?;
        state
            .store
            .attach_comment_images(comment_id, identity.id, &urls)
            .await?;
    }

    let comment = state
        .store
        .comment_by_id(comment_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("comment vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<CommentUpdate>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let matched = state
        .store
        .update_comment(id, identity.id, &payload.content)
        .await?;
    if !matched {
        return Err(AppError::Forbidden(
            "You can only edit your own comments.".to_string(),
        ));
    }
    Ok(Json(MessageResponse::new("Comment updated successfully.")))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let image_urls = state.store.comment_image_urls(id).await?;
    let deleted = state.store.delete_comment(id, identity.id).await?;
    if deleted == 0 {
        return Err(AppError::Forbidden(
            "You can only delete your own comments.".to_string(),
        ));
    }
    remove_stored_images(&state, image_urls);
    Ok(Json(MessageResponse::new("Comment deleted successfully.")))
}
