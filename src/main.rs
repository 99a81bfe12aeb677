use clap::{Parser, Subcommand};
use explorer_leaderboard::{
    auth::{login_user, signup_user, AuthSession, IdentityToolkitClient},
    backend::{DataSource, MemoryDataSource, MemoryObjectStore, ObjectStore, RealtimeDbClient, StorageClient},
    leaderboard::{rank, SnapshotLoader},
    models::{Metric, ProfileView, RankingView},
    profile::{ImageUpload, ProfilePictures, ProfileViewer},
    Settings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod tui_main;

#[derive(Parser)]
#[clap(name = "explorer-leaderboard")]
#[clap(about = "Leaderboard and profiles for Mars explorers", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the leaderboard once
    Leaderboard {
        /// totalScore, basalt, water, regolith, smeciteClay, gypsum or carbonateRock
        #[clap(short, long, default_value = "totalScore")]
        metric: String,

        /// Only show the first N explorers
        #[clap(short, long)]
        limit: Option<usize>,

        /// Use built-in sample data instead of the database
        #[clap(long)]
        demo: bool,
    },

    /// Launch the live leaderboard TUI
    Tui {
        #[clap(long)]
        demo: bool,
    },

    /// Sign in and show your profile
    Login {
        #[clap(short, long)]
        email: String,

        #[clap(short, long)]
        password: String,
    },

    /// Create an account
    Signup {
        #[clap(short, long)]
        email: String,

        #[clap(short, long)]
        password: String,

        /// Password again
        #[clap(short, long)]
        confirm: String,
    },

    /// Show an explorer's profile
    Profile {
        #[clap(short, long)]
        user_id: String,

        #[clap(long)]
        demo: bool,
    },

    /// Upload or remove your profile picture
    Photo {
        #[clap(short, long)]
        email: String,

        #[clap(short, long)]
        password: String,

        /// Image to upload (JPG, PNG, GIF, max 5MB)
        #[clap(short, long, conflicts_with = "remove")]
        file: Option<PathBuf>,

        /// Remove the current picture
        #[clap(long)]
        remove: bool,

        #[clap(long)]
        demo: bool,
    },
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Using default settings ({})", e);
        Settings::default()
    });

    if let Err(e) = settings.validate() {
        eprintln!("Invalid settings: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    // the TUI installs its own silent subscriber
    if !matches!(cli.command, Commands::Tui { .. }) {
        init_logging(&settings);
    }

    match cli.command {
        Commands::Leaderboard { metric, limit, demo } => {
            let metric: Metric = metric.parse()?;
            let loader = SnapshotLoader::new(data_source(&settings, demo, None)?);

            match loader.load_all().await {
                Ok(records) => print_ranking(&rank(&records, metric), limit),
                Err(e) => {
                    error!("Error loading leaderboard data: {}", e);
                    println!("\n⚠️ {}", e.user_message());
                    println!("Please check your connection and try again.");
                }
            }
        }

        Commands::Tui { demo } => {
            tui_main::run_tui(settings, demo).await?;
        }

        Commands::Login { email, password } => {
            let auth = IdentityToolkitClient::new(&settings.backend)?;
            match login_user(&auth, &email, &password).await {
                Ok(session) => {
                    println!("\nWelcome back, {}!", session.username());
                    let viewer = ProfileViewer::new(data_source(&settings, false, Some(&session))?);
                    match viewer.load(&session.uid).await? {
                        Some(profile) => print_profile(&profile),
                        None => println!("No profile found in database."),
                    }
                }
                Err(e) => println!("\n❌ {}", e),
            }
        }

        Commands::Signup { email, password, confirm } => {
            let auth = IdentityToolkitClient::new(&settings.backend)?;
            match signup_user(&auth, &email, &password, &confirm).await {
                Ok(session) => {
                    println!("\nAccount created! Welcome, Explorer.");
                    println!("Signed in as {} ({})", session.username(), session.uid);
                }
                Err(e) => println!("\n❌ {}", e),
            }
        }

        Commands::Profile { user_id, demo } => {
            let viewer = ProfileViewer::new(data_source(&settings, demo, None)?);
            match viewer.load(&user_id).await? {
                Some(profile) => print_profile(&profile),
                None => println!("No profile found in database."),
            }
        }

        Commands::Photo { email, password, file, remove, demo } => {
            let (uid, source, store): (String, Arc<dyn DataSource>, Arc<dyn ObjectStore>) = if demo {
                info!("Using in-memory storage for photo demo");
                ("a1f3".to_string(), Arc::new(MemoryDataSource::demo()), Arc::new(MemoryObjectStore::new()))
            } else {
                let auth = IdentityToolkitClient::new(&settings.backend)?;
                let session = login_user(&auth, &email, &password).await?;
                (
                    session.uid.clone(),
                    data_source(&settings, false, Some(&session))?,
                    Arc::new(StorageClient::new(&settings.backend, session.id_token.clone())?),
                )
            };
            let pictures = ProfilePictures::new(source, store);

            if remove {
                pictures.remove(&uid).await?;
                println!("Profile picture removed.");
            } else if let Some(path) = file {
                let image = ImageUpload::from_path(&path).await?;
                match pictures.upload(&uid, image).await {
                    Ok(url) => println!("Profile picture updated: {}", url),
                    Err(e) => println!("❌ {}", e),
                }
            } else {
                match pictures.current(&uid).await? {
                    Some(url) => println!("Current profile picture: {}", url),
                    None => println!("No profile picture set."),
                }
            }
        }
    }

    Ok(())
}

fn data_source(
    settings: &Settings,
    demo: bool,
    session: Option<&AuthSession>,
) -> anyhow::Result<Arc<dyn DataSource>> {
    if demo {
        return Ok(Arc::new(MemoryDataSource::demo()));
    }

    let client = RealtimeDbClient::new(&settings.backend)?;
    Ok(match session {
        Some(session) => Arc::new(client.with_auth_token(session.id_token.clone())),
        None => Arc::new(client),
    })
}

fn print_ranking(view: &RankingView, limit: Option<usize>) {
    println!("\n=== {} LEADERBOARD ===", view.metric.display_name().to_uppercase());

    if view.is_empty() {
        println!("No explorers yet.");
        return;
    }

    println!(
        "Explorers: {}   Top score: {:.1}   Average: {:.1}\n",
        view.count, view.top_value, view.average_value
    );
    println!("{:<6}{:<32}{:>12}  {}", "Rank", "Explorer", view.metric.score_header(), "Samples");

    let now = chrono::Utc::now();
    for entry in view.entries().take(limit.unwrap_or(usize::MAX)) {
        let joined = entry
            .days_since_joined(now)
            .map(|d| format!(" (joined {}d ago)", d))
            .unwrap_or_default();
        println!(
            "{:<6}{:<32}{:>12.1}  {}{}",
            entry.rank,
            entry.record.display_name,
            entry.score,
            entry.samples_label(),
            joined
        );
    }
}

fn print_profile(profile: &ProfileView) {
    println!("\n=== Explorer {} ===", profile.display_name);
    println!("Email: {}", profile.email);
    println!("Account created: {}", profile.account_created);
    println!("Last login: {}", profile.last_login);
    println!("Total score: {:.1}", profile.total_score);
    if let Some(url) = &profile.photo_url {
        println!("Photo: {}", url);
    }

    println!("\nSamples:");
    if profile.samples.is_empty() {
        println!("  none collected yet");
    }
    for sample in &profile.samples {
        match sample.high_score {
            Some(high) => println!("  {}: {} (high score {:.1})", sample.material, sample.amount, high),
            None => println!("  {}: {}", sample.material, sample.amount),
        }
    }
}
