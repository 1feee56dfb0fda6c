use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use nectaris::filter::{FlowerFilter, ListingFilter};
use nectaris::listing_form::ImageFile;
use nectaris::models::{Listing, Role};
use nectaris::notify::Level;
use nectaris::routes::Route;
use nectaris::views::{
    AccountView, AdminDashboard, AuthView, BeekeeperDashboard, LandDetail, LandownerDashboard,
};
use nectaris::{AppContext, Config};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Nectaris: land for beehives, from the terminal
#[derive(Parser)]
#[command(name = "nectaris", version)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    #[arg(long, env = "NECTARIS_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "NECTARIS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct BackendArgs {
    #[arg(long, env = "NECTARIS_SUPABASE_URL")]
    url: Option<String>,

    #[arg(long, env = "NECTARIS_SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    #[arg(long, env = "NECTARIS_IMAGE_BUCKET")]
    bucket: Option<String>,

    #[arg(long, env = "NECTARIS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Signup {
        #[arg(long, default_value = "beekeeper")]
        role: Role,
    },
    /// Resolve a path such as `/land/<id>` and show that view
    Open { path: String },
    /// Search verified listings
    Browse {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "all")]
        flower: String,
        #[arg(long)]
        favorites: bool,
    },
    /// Add or remove a listing from favorites
    Favorite { id: Uuid },
    /// Create a listing (landowner)
    Add(AddArgs),
    /// Approve a pending listing (admin)
    Verify { id: Uuid },
    /// Reject a pending listing (admin)
    Deny { id: Uuid },
    /// Permanently delete a listing (admin)
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show or change the display name
    Account {
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    space: String,
    #[arg(long)]
    price: String,
    /// Repeat for several flowers
    #[arg(long = "flower", required = true)]
    flowers: Vec<String>,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    from: String,
    #[arg(long, default_value = "")]
    until: String,
    #[arg(long = "image")]
    images: Vec<PathBuf>,
}

impl BackendArgs {
    fn into_config(self) -> Result<Config> {
        let mut config = match (self.url, self.anon_key) {
            (Some(url), Some(key)) => Config::new(url, key),
            _ => Config::from_env().context("Backend URL and anon key are required")?,
        };
        if let Some(bucket) = self.bucket {
            config.image_bucket = bucket;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.backend.into_config()?;
    let ctx = AppContext::connect(config).context("Failed to create backend client")?;

    info!("🐝 Nectaris");

    let result = run(&ctx, cli.email, cli.password, cli.command).await;
    print_notifications(&ctx);
    result
}

async fn run(ctx: &AppContext, email: Option<String>, password: Option<String>, command: Command) -> Result<()> {
    let (email, password) = match (email, password) {
        (Some(email), Some(password)) => (email, password),
        _ => bail!("--email and --password (or NECTARIS_EMAIL / NECTARIS_PASSWORD) are required"),
    };

    if let Command::Signup { role } = command {
        let view = AuthView::mount(ctx.clone(), Some(role));
        let route = view.sign_up(&email, &password).await?;
        println!("Account created, continue at {}", route);
        return Ok(());
    }

    let landing = AuthView::mount(ctx.clone(), None)
        .sign_in(&email, &password)
        .await
        .context("Sign-in failed")?;

    match command {
        Command::Signup { .. } => unreachable!("handled above"),
        Command::Open { path } => open(ctx, Route::parse(&path), landing).await?,
        Command::Browse {
            search,
            location,
            flower,
            favorites,
        } => {
            let mut view = BeekeeperDashboard::mount(ctx.clone())?;
            view.load().await?;
            view.filter = ListingFilter {
                search,
                location,
                flower: FlowerFilter::parse(&flower),
                favorites_only: favorites,
            };
            print_beekeeper(&view);
        }
        Command::Favorite { id } => {
            let mut view = BeekeeperDashboard::mount(ctx.clone())?;
            view.load().await?;
            view.toggle_favorite(id).await?;
        }
        Command::Add(args) => {
            let mut view = LandownerDashboard::mount(ctx.clone())?;
            let mut images = Vec::with_capacity(args.images.len());
            for path in &args.images {
                images.push(
                    ImageFile::from_path(path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                );
            }

            let form = view.form();
            form.title = args.title;
            form.location = args.location;
            form.description = args.description;
            form.space_hectares = args.space;
            form.price_per_month = args.price;
            form.available_from = args.from;
            form.available_until = args.until;
            form.images = images;
            for flower in &args.flowers {
                form.toggle_flower(flower);
            }

            let created = view.submit().await?;
            println!("Created {} ({})", created.title, created.id);
            print_landowner(&view);
        }
        Command::Verify { id } => {
            let mut view = AdminDashboard::mount(ctx.clone()).await?;
            view.verify(id).await?;
            print_admin(&view);
        }
        Command::Deny { id } => {
            let mut view = AdminDashboard::mount(ctx.clone()).await?;
            view.deny(id).await?;
            print_admin(&view);
        }
        Command::Delete { id, yes } => {
            let mut view = AdminDashboard::mount(ctx.clone()).await?;
            let deleted = view.delete(id, |listing| yes || confirm(listing)).await?;
            if !deleted {
                println!("Kept {}", id);
            }
            print_admin(&view);
        }
        Command::Account { name } => {
            let mut view = AccountView::mount(ctx.clone())?;
            view.load().await?;
            if let Some(name) = name {
                view.full_name = name;
                view.save().await?;
            }
            if let Some(profile) = view.profile() {
                println!("{} ({})", profile.email, profile.role);
                println!("   Name: {}", profile.full_name.as_deref().unwrap_or("-"));
            }
        }
    }

    Ok(())
}

/// Dispatch a path to its view, as a browser router would
async fn open(ctx: &AppContext, route: Route, landing: Route) -> Result<()> {
    match route {
        Route::Home => {
            println!("🐝 Teren pentru stupi\n");
            for (role, route) in Route::entry_points() {
                println!("   {}: {}", role, route);
            }
            println!("\nSigned in, your dashboard is {}", landing);
        }
        Route::Auth { .. } => println!("Already signed in, continue at {}", landing),
        Route::Beekeeper => {
            let mut view = BeekeeperDashboard::mount(ctx.clone())?;
            view.load().await?;
            print_beekeeper(&view);
        }
        Route::Landowner => {
            let mut view = LandownerDashboard::mount(ctx.clone())?;
            view.load().await?;
            print_landowner(&view);
        }
        Route::Admin => {
            let view = AdminDashboard::mount(ctx.clone()).await?;
            print_admin(&view);
        }
        Route::LandDetail { id } => {
            let mut view = LandDetail::mount(ctx.clone(), id);
            match view.load().await? {
                Some(listing) => print_listing(0, listing),
                None => println!("Terenul nu a fost găsit"),
            }
            if let Some(availability) = view.availability() {
                println!("   {}", availability);
            }
        }
        Route::Account => {
            let mut view = AccountView::mount(ctx.clone())?;
            if let Some(profile) = view.load().await? {
                println!("{} ({})", profile.email, profile.role);
            }
        }
        Route::NotFound { path } => println!("404: nothing at {}", path),
    }
    Ok(())
}

fn confirm(listing: &Listing) -> bool {
    print!("Delete \"{}\" permanently? [y/N] ", listing.title);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    io::stdin().read_line(&mut answer).is_ok() && answer.trim().eq_ignore_ascii_case("y")
}

fn print_listing(index: usize, listing: &Listing) {
    println!("{}. {} ({} / lună)", index + 1, listing.title, listing.price_per_month);
    println!("   {} ha, {}", listing.space_hectares, listing.location);
    println!("   Flori: {}", listing.flower_badges().join(", "));
    println!("   Status: {}", listing.verification_status);
    println!("   ID: {}", listing.id);
    if let Some(image) = listing.cover_image() {
        println!("   Image: {}", image);
    }
    println!();
}

fn print_beekeeper(view: &BeekeeperDashboard) {
    println!("{}\n", view.heading());
    let visible = view.visible();
    if visible.is_empty() {
        println!("{}", view.empty_message());
    }
    for (i, listing) in visible.iter().enumerate() {
        print_listing(i, listing);
        if view.is_favorite(listing.id) {
            println!("   ♥ favorit");
        }
    }
}

fn print_landowner(view: &LandownerDashboard) {
    if view.listings().is_empty() {
        println!("You haven't added any land listings yet");
    }
    for (i, listing) in view.listings().iter().enumerate() {
        print_listing(i, listing);
    }
}

fn print_admin(view: &AdminDashboard) {
    let stats = view.stats();
    println!(
        "Users: {}  Listings: {}  Pending: {}  Bookings: {}\n",
        stats.users, stats.listings, stats.pending_listings, stats.bookings
    );
    for (i, listing) in view.snapshot().listings.iter().enumerate() {
        print_listing(i, listing);
        let actions: Vec<String> = view
            .actions_for(listing)
            .iter()
            .map(|a| format!("{:?}", a).to_lowercase())
            .collect();
        println!("   Actions: {}", actions.join(", "));
    }
    for booking in &view.snapshot().bookings {
        let title = booking.land.as_ref().map(|l| l.title.as_str()).unwrap_or("?");
        println!(
            "Booking {}: {} → {} ({:?}, {})",
            title, booking.start_date, booking.end_date, booking.status, booking.total_price
        );
    }
}

fn print_notifications(ctx: &AppContext) {
    for note in ctx.notifier.drain() {
        match note.level {
            Level::Success => println!("✅ {}", note.message),
            Level::Error => eprintln!("❌ {}", note.message),
        }
    }
}
