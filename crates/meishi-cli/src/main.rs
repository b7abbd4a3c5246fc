//! Command-line front end for the card service.

mod image;

use clap::{Parser, Subcommand, ValueEnum};
use meishi_api::{
    ApiConfig, CancelHandle, CardClient, CardFields, CardPatch, NewCardImage, SearchParams, SortBy,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "meishi")]
#[command(about = "Business-card capture and correction client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a card photo and wait for the extracted fields.
    Add {
        /// Path to the card photo.
        image: PathBuf,
        /// Filename reported to the backend; defaults to the file's own name.
        #[arg(long)]
        filename: Option<String>,
    },
    /// Correct fields on a stored card. Fields without a flag keep their
    /// stored value.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        website: Option<String>,
        /// Comma-joined tag list.
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List stored cards.
    Cards {
        /// Free-text filter across name, company, title, email and notes.
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Creation date lower bound, YYYY-MM-DD.
        #[arg(long)]
        from: Option<String>,
        /// Creation date upper bound, YYYY-MM-DD.
        #[arg(long)]
        to: Option<String>,
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortArg,
    },
    /// Show one card in full.
    Show { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    Company,
}

impl From<SortArg> for SortBy {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Newest => SortBy::Newest,
            SortArg::Company => SortBy::Company,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "meishi=info,meishi_api=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = ApiConfig::from_env()?;
    let client = CardClient::new(config)?;

    match cli.command {
        Command::Add { image, filename } => add(&client, &image, filename).await,
        Command::Update {
            id,
            name,
            company,
            title,
            phone,
            email,
            address,
            website,
            tags,
            notes,
        } => {
            let overlay = CardPatch {
                name,
                company,
                title,
                phone,
                email,
                address,
                website,
                tags,
                notes,
            };
            update(&client, &id, overlay).await
        }
        Command::Cards {
            q,
            company,
            tag,
            from,
            to,
            sort,
        } => {
            let params = SearchParams {
                q: q.unwrap_or_default(),
                company: company.unwrap_or_default(),
                tag: tag.unwrap_or_default(),
                from: from.unwrap_or_default(),
                to: to.unwrap_or_default(),
                sort: sort.into(),
            };
            cards(&client, &params).await
        }
        Command::Show { id } => show(&client, &id).await,
    }
}

async fn add(client: &CardClient, path: &Path, filename: Option<String>) -> anyhow::Result<()> {
    let image_base64 = image::load_base64(path)?;
    let filename =
        filename.or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()));

    let handle = CancelHandle::new();
    let token = handle.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling; the card may still be created server-side");
            handle.cancel();
        }
    });

    info!("uploading {}", path.display());
    println!("Uploading card, waiting for extraction...");
    let created = client
        .add_with_cancel(
            NewCardImage {
                image_base64,
                filename,
            },
            token,
        )
        .await?;

    println!("Created {}", created.id);
    print_fields(&created.fields);
    Ok(())
}

async fn update(client: &CardClient, id: &str, overlay: CardPatch) -> anyhow::Result<()> {
    // The backend replaces the whole field set, so start from the stored
    // record and overlay the flags the caller passed.
    let current = client.get(id).await?;
    let patch = CardPatch::from(current.fields).merge(overlay);
    client.update(id, &patch).await?;
    println!("Updated {}", id);
    Ok(())
}

async fn cards(client: &CardClient, params: &SearchParams) -> anyhow::Result<()> {
    let items = client.search(params).await?;
    if items.is_empty() {
        println!("No cards matched.");
        return Ok(());
    }
    for record in &items {
        println!(
            "{}  {}  {}  {}",
            record.id, record.created_at, record.fields.name, record.fields.company
        );
    }
    println!("{} card(s)", items.len());
    Ok(())
}

async fn show(client: &CardClient, id: &str) -> anyhow::Result<()> {
    let record = client.get(id).await?;
    println!("id:         {}", record.id);
    println!("created_at: {}", record.created_at);
    if !record.image_url.is_empty() {
        println!("image:      {}", record.image_url);
    }
    print_fields(&record.fields);
    Ok(())
}

fn print_fields(fields: &CardFields) {
    println!("name:    {}", fields.name);
    println!("company: {}", fields.company);
    println!("title:   {}", fields.title);
    println!("phone:   {}", fields.phone);
    println!("email:   {}", fields.email);
    println!("address: {}", fields.address);
    println!("website: {}", fields.website);
    println!("tags:    {}", fields.tags);
    println!("notes:   {}", fields.notes);
}
