use async_trait::async_trait;

use postgres_types::Json;
use tokio_postgres::Row;

use uuid::Uuid;

use crate::error::*;

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct PgPostStore {
  // get posts
  post_by_id: VersionedStatement,
  posts: VersionedStatement,

  // store/delete post
  insert_post: VersionedStatement,
  delete_post: VersionedStatement,

  // (un)like post
  like_post: VersionedStatement,
  unlike_post: VersionedStatement,

  // comments
  add_comment: VersionedStatement,
  remove_comment: VersionedStatement,
}

lazy_static! {
  static ref POST_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "posts",
      columns: vec![
        noted("id", ColumnNote::Primary),
        noted("user_id", ColumnNote::Fixed),
        column("text"),
        column("name"),
        column("avatar"),
        column("likes"),
        column("comments"),
        noted("date", ColumnNote::Fixed),
      ],
    }
  };
}

fn post_from_row(row: &Row) -> Post {
  let likes: Json<Vec<Like>> = row.get(5);
  let comments: Json<Vec<Comment>> = row.get(6);
  Post {
    id: row.get(0),
    user: row.get(1),
    text: row.get(2),
    name: row.get(3),
    avatar: row.get(4),
    likes: likes.0,
    comments: comments.0,
    date: row.get(7),
  }
}

fn post_from_opt_row(row: &Option<Row>) -> Option<Post> {
  row.as_ref().map(post_from_row)
}

fn likes_from_row(row: &Row) -> Vec<Like> {
  let likes: Json<Vec<Like>> = row.get(0);
  likes.0
}

fn comments_from_row(row: &Row) -> Vec<Comment> {
  let comments: Json<Vec<Comment>> = row.get(0);
  comments.0
}

impl PgPostStore {
  pub fn new(cl: SharedClient) -> Result<PgPostStore> {
    let select = POST_COLUMNS.build_select_query(false);
    let post_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select))?;
    let posts = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ORDER BY date DESC"#, select))?;

    let insert_post = VersionedStatement::new(cl.clone(),
        &format!(r#"{} RETURNING {}"#,
          POST_COLUMNS.build_insert_query(false), POST_COLUMNS.get_columns(false)))?;
    let delete_post = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM posts WHERE id = $1 AND user_id = $2"#)?;

    // Each list mutation is a single conditional UPDATE.  No row back means
    // the guard failed, the caller then looks the post up to find out why.
    let like_post = VersionedStatement::new(cl.clone(),
        r#"UPDATE posts SET likes = likes || $2::jsonb
        WHERE id = $1 AND NOT likes @> $2::jsonb RETURNING likes"#)?;
    let unlike_post = VersionedStatement::new(cl.clone(),
        r#"UPDATE posts SET likes = COALESCE(
          (SELECT jsonb_agg(l ORDER BY i) FROM jsonb_array_elements(likes) WITH ORDINALITY AS t(l, i)
            WHERE l->>'user' <> $2), '[]'::jsonb)
        WHERE id = $1 AND likes @> $3::jsonb RETURNING likes"#)?;
    let add_comment = VersionedStatement::new(cl.clone(),
        r#"UPDATE posts SET comments = comments || $2::jsonb
        WHERE id = $1 RETURNING comments"#)?;
    let remove_comment = VersionedStatement::new(cl,
        r#"UPDATE posts SET comments = COALESCE(
          (SELECT jsonb_agg(c ORDER BY i) FROM jsonb_array_elements(comments) WITH ORDINALITY AS t(c, i)
            WHERE c->>'_id' <> $2), '[]'::jsonb)
        WHERE id = $1 AND comments @> $3::jsonb RETURNING comments"#)?;

    Ok(PgPostStore {
      post_by_id,
      posts,
      insert_post,
      delete_post,
      like_post,
      unlike_post,
      add_comment,
      remove_comment,
    })
  }

  /// Explain why a guarded update on post `id` matched nothing.
  async fn rejected<T>(&self, id: Uuid, comment_id: Option<Uuid>, otherwise: PostUpdate<T>) -> Result<PostUpdate<T>> {
    let post = match self.get(id).await? {
      Some(post) => post,
      None => return Ok(PostUpdate::PostNotFound),
    };
    if let Some(comment_id) = comment_id {
      if !post.comments.iter().any(|c| c.id == comment_id) {
        return Ok(PostUpdate::CommentNotFound);
      }
    }
    Ok(otherwise)
  }
}

#[async_trait(?Send)]
impl PostStore for PgPostStore {
  async fn prepare(&self) -> Result<()> {
    self.post_by_id.prepare().await?;
    self.posts.prepare().await?;
    self.insert_post.prepare().await?;
    self.delete_post.prepare().await?;
    self.like_post.prepare().await?;
    self.unlike_post.prepare().await?;
    self.add_comment.prepare().await?;
    self.remove_comment.prepare().await?;

    Ok(())
  }

  async fn create(&self, post: Post) -> Result<Post> {
    let likes = Json(&post.likes);
    let comments = Json(&post.comments);
    let row = self.insert_post.query_one(&[
      &post.id, &post.user, &post.text, &post.name, &post.avatar, &likes, &comments, &post.date,
    ]).await?;
    Ok(post_from_row(&row))
  }

  async fn list(&self) -> Result<Vec<Post>> {
    let rows = self.posts.query(&[]).await?;
    Ok(rows.iter().map(post_from_row).collect())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Post>> {
    let row = self.post_by_id.query_opt(&[&id]).await?;
    Ok(post_from_opt_row(&row))
  }

  async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<()>> {
    if self.delete_post.execute(&[&id, &user_id]).await? > 0 {
      return Ok(PostUpdate::Updated(()));
    }
    self.rejected(id, None, PostUpdate::NotAuthorized).await
  }

  async fn like(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Like>>> {
    let like = Json(vec![Like { user: user_id }]);
    match self.like_post.query_opt(&[&id, &like]).await? {
      Some(row) => Ok(PostUpdate::Updated(likes_from_row(&row))),
      None => self.rejected(id, None, PostUpdate::Unchanged).await,
    }
  }

  async fn unlike(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Like>>> {
    let like = Json(vec![Like { user: user_id }]);
    match self.unlike_post.query_opt(&[&id, &user_id.to_string(), &like]).await? {
      Some(row) => Ok(PostUpdate::Updated(likes_from_row(&row))),
      None => self.rejected(id, None, PostUpdate::Unchanged).await,
    }
  }

  async fn add_comment(&self, id: Uuid, comment: Comment) -> Result<PostUpdate<Vec<Comment>>> {
    let entry = Json(vec![comment]);
    match self.add_comment.query_opt(&[&id, &entry]).await? {
      Some(row) => Ok(PostUpdate::Updated(comments_from_row(&row))),
      None => Ok(PostUpdate::PostNotFound),
    }
  }

  async fn remove_comment(&self, id: Uuid, comment_id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Comment>>> {
    let owned = Json(json!([{ "_id": comment_id, "user": user_id }]));
    match self.remove_comment.query_opt(&[&id, &comment_id.to_string(), &owned]).await? {
      Some(row) => Ok(PostUpdate::Updated(comments_from_row(&row))),
      None => self.rejected(id, Some(comment_id), PostUpdate::NotAuthorized).await,
    }
  }
}
