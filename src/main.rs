use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use knot::areas::repository::Repository;
use knot::commands::plumbing::cat_file::CatFileMode;
use knot::commands::porcelain::tag::TagOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "knot",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A content-addressed version-control store",
    long_about = "knot stores file snapshots as content-addressed objects, \
    stages them through a binary index, and names commits with tags. \
    The on-disk layout follows git's loose object and index formats.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Compute the blob id of a file and optionally store it",
        long_about = "This command hashes a file as a blob and can write it to the object database."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: String,
    },
    #[command(
        name = "cat-file",
        about = "Print an object, its type or its size",
        group = ArgGroup::new("mode").required(true).args(["pretty", "kind", "size"])
    )]
    CatFile {
        #[arg(short = 'p', help = "Pretty-print the object content")]
        pretty: bool,
        #[arg(short = 't', help = "Print the object type")]
        kind: bool,
        #[arg(short = 's', help = "Print the object size")]
        size: bool,
        #[arg(index = 1, help = "The object to show")]
        name: String,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(short, long, help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, help = "A tree, or a commit or tag naming one")]
        name: String,
    },
    #[command(name = "ls-files", about = "List the paths staged in the index")]
    LsFiles {
        #[arg(short, long, help = "Show mode, object id and stage number")]
        stage: bool,
    },
    #[command(name = "update-index", about = "Stage or unstage individual files")]
    UpdateIndex {
        #[arg(long, help = "Allow files not yet in the index")]
        add: bool,
        #[arg(long, help = "Drop files missing from the workspace")]
        remove: bool,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    #[command(
        name = "add",
        about = "Add files to the index",
        long_about = "This command stages files and directories. Nothing is staged if any file cannot be read."
    )]
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    #[command(name = "write-tree", about = "Store the tree of the current index")]
    WriteTree,
    #[command(name = "commit-tree", about = "Store a commit for an existing tree")]
    CommitTree {
        #[arg(index = 1, help = "The tree to commit")]
        tree: String,
        #[arg(short = 'p', help = "A parent commit, repeatable")]
        parents: Vec<String>,
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command creates a new commit in the repository with the specified commit message."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "tag",
        about = "Create, list, or delete tags",
        group = ArgGroup::new("action").args(["list", "delete"])
    )]
    Tag {
        #[arg(short, long, help = "List tags")]
        list: bool,
        #[arg(short, long, help = "Delete the named tag")]
        delete: bool,
        #[arg(short, long, help = "Create an annotated tag")]
        annotate: bool,
        #[arg(short, long, help = "Replace an existing tag")]
        force: bool,
        #[arg(short, long, help = "The tag message (implies -a)")]
        message: Option<String>,
        #[arg(index = 1)]
        name: Option<String>,
        #[arg(index = 2, conflicts_with = "action")]
        target: Option<String>,
    },
    #[command(name = "rev-parse", about = "Resolve a revision to an object id")]
    RevParse {
        #[arg(index = 1)]
        name: String,
    },
    #[command(name = "show-ref", about = "List branches and tags with their object ids")]
    ShowRef,
}

fn open_repository(path: Option<&PathBuf>) -> Result<Repository> {
    let path = match path {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    Repository::new(&path, Box::new(std::io::stdout()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => open_repository(path.as_ref())?.init().await?,
        Commands::HashObject { write, file } => {
            open_repository(None)?.hash_object(&file, write)?
        }
        Commands::CatFile {
            kind, size, name, ..
        } => {
            let mode = if kind {
                CatFileMode::Type
            } else if size {
                CatFileMode::Size
            } else {
                CatFileMode::Pretty
            };

            open_repository(None)?.cat_file(&name, mode)?
        }
        Commands::LsTree { recursive, name } => open_repository(None)?.ls_tree(&name, recursive)?,
        Commands::LsFiles { stage } => open_repository(None)?.ls_files(stage).await?,
        Commands::UpdateIndex { add, remove, paths } => {
            open_repository(None)?
                .update_index(&paths, add, remove)
                .await?
        }
        Commands::Add { paths } => open_repository(None)?.add(&paths).await?,
        Commands::WriteTree => open_repository(None)?.write_tree().await?,
        Commands::CommitTree {
            tree,
            parents,
            message,
        } => open_repository(None)?.commit_tree(&tree, &parents, &message)?,
        Commands::Commit { message } => open_repository(None)?.commit(&message).await?,
        Commands::Tag {
            list,
            delete,
            annotate,
            force,
            message,
            name,
            target,
        } => {
            let mut repository = open_repository(None)?;

            match name {
                Some(name) if delete => repository.delete_tag(&name)?,
                Some(name) if !list => repository.tag(
                    &name,
                    TagOptions {
                        target: target.as_deref(),
                        annotate,
                        message: message.as_deref(),
                        force,
                    },
                )?,
                None if delete => anyhow::bail!("tag name required"),
                _ => repository.list_tags()?,
            }
        }
        Commands::RevParse { name } => open_repository(None)?.rev_parse(&name)?,
        Commands::ShowRef => open_repository(None)?.show_ref()?,
    }

    Ok(())
}
