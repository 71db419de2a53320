use std::time::Duration;

use anyhow::{anyhow, Context};
use snapgram_client::{
    api::{self, CommentId, PostId, UserId},
    BackendConfig, CommentStore, HttpBackend, StoreConfig,
};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base url of the document service api
    #[structopt(long, env = "SNAPGRAM_ENDPOINT")]
    endpoint: String,

    #[structopt(long, env = "SNAPGRAM_PROJECT_ID")]
    project_id: String,

    #[structopt(long, env = "SNAPGRAM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[structopt(long, env = "SNAPGRAM_DATABASE_ID")]
    database_id: String,

    #[structopt(long, env = "SNAPGRAM_COMMENTS_COLLECTION_ID", default_value = "comments")]
    comments_collection_id: String,

    #[structopt(long, env = "SNAPGRAM_USERS_COLLECTION_ID", default_value = "users")]
    users_collection_id: String,

    /// Retries of requests failing for transient reasons
    #[structopt(long, default_value = "3")]
    max_retries: u32,

    /// Timeout of each request, in seconds
    #[structopt(long, default_value = "10")]
    timeout: u64,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, structopt::StructOpt)]
enum Command {
    /// List the comments of a post, oldest first
    List { post: String },

    /// Comment on a post
    Add {
        post: String,

        /// Id of the commenting user
        user: String,

        /// Name to display for the commenting user
        user_name: String,

        content: String,
    },

    /// Delete a comment
    Delete { comment: String },
}

fn print_comment(c: &api::Comment) {
    println!(
        "{}\t{}\t{}\t{}",
        c.id,
        c.created_at.to_rfc3339(),
        c.user_name,
        c.content
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    tracing::debug!(
        endpoint = %opt.endpoint,
        project = %opt.project_id,
        database = %opt.database_id,
        comments = %opt.comments_collection_id,
        users = %opt.users_collection_id,
        authenticated = opt.api_key.is_some(),
        max_retries = opt.max_retries,
        timeout_secs = opt.timeout,
        "resolved configuration"
    );
    tracing::debug!(cmd = ?opt.cmd, "running command");

    let backend = HttpBackend::new(BackendConfig {
        endpoint: opt.endpoint,
        project_id: opt.project_id,
        api_key: opt.api_key,
        database_id: opt.database_id,
        comments_collection_id: opt.comments_collection_id,
        users_collection_id: opt.users_collection_id,
        max_retries: opt.max_retries,
    });
    let store = CommentStore::with_config(
        backend,
        StoreConfig {
            timeout: Duration::from_secs(opt.timeout),
            ..StoreConfig::default()
        },
    );

    match opt.cmd {
        Command::List { post } => {
            let comments = store
                .try_list(&PostId(post.clone()))
                .await
                .with_context(|| format!("listing comments of post {post}"))?;
            for c in &comments {
                print_comment(c);
            }
        }
        Command::Add {
            post,
            user,
            user_name,
            content,
        } => {
            api::validate_content(&content).context("validating comment")?;
            let comment = store
                .add(&PostId(post.clone()), &UserId(user), &user_name, &content)
                .await
                .ok_or_else(|| anyhow!("failed adding comment to post {post}, see logs"))?;
            print_comment(&comment);
        }
        Command::Delete { comment } => {
            if !store.delete(&CommentId(comment.clone())).await {
                return Err(anyhow!("failed deleting comment {comment}, see logs"));
            }
        }
    }

    Ok(())
}
