//! `pdms` — command-line client for the program document server.
//!
//! # Usage
//!
//! ```
//! pdms --url http://localhost:4000 login --email me@example.edu
//! pdms save btech-cse.json --sections section3
//! pdms versions BTECH-CSE
//! pdms logout
//! ```

mod client;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use client::ApiClient;
use pdms_core::{account::Role, document::DocumentListing};
use serde_json::{Value, json};
use session::{DEFAULT_URL, Session};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pdms", about = "Command-line client for program documents")]
struct Args {
  /// Session file holding the server URL and token.
  #[arg(long, env = "PDMS_SESSION", value_name = "FILE")]
  session: Option<PathBuf>,

  /// Server base URL; overrides the session's.
  #[arg(long, env = "PDMS_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log in and store the session token.
  Login {
    #[arg(long, value_enum, default_value_t = LoginAs::Creator)]
    role:     LoginAs,
    #[arg(long)]
    email:    String,
    #[arg(long, env = "PDMS_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Forget the stored session.
  Logout,
  /// Save a program document from a JSON payload file.
  Save {
    file:     PathBuf,
    /// Publish as a brand-new program at version 1.0.0.
    #[arg(long)]
    new:      bool,
    /// Only rewrite these sections (e.g. `section2,section3`).
    #[arg(long, value_delimiter = ',')]
    sections: Vec<String>,
  },
  /// List the most recent versions of a program.
  Versions {
    code:  String,
    #[arg(long, default_value_t = 5)]
    limit: usize,
  },
  /// Print the latest version of a program.
  Latest { code: String },
  /// Print one stored version by id.
  Fetch { id: Uuid },
  /// List your own saved documents.
  History,
  /// Show your dashboard counts.
  Stats,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LoginAs {
  Creator,
  Admin,
  Developer,
}

impl From<LoginAs> for Role {
  fn from(l: LoginAs) -> Self {
    match l {
      LoginAs::Creator => Role::Creator,
      LoginAs::Admin => Role::Admin,
      LoginAs::Developer => Role::Developer,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let session_path = args.session.unwrap_or_else(Session::default_path);

  // The --url flag overrides the stored session, which overrides the default.
  let stored = Session::load(&session_path)?;
  let mut session = stored.unwrap_or_else(|| Session::anonymous(DEFAULT_URL));
  if let Some(url) = args.url {
    session.base_url = url;
  }

  match args.command {
    Command::Login { role, email, password } => {
      let client = ApiClient::new(Session::anonymous(session.base_url))?;
      let session = client.login(role.into(), &email, &password).await?;
      session.save(&session_path)?;
      println!("Logged in to {} as {email}", session.base_url);
    }
    Command::Logout => {
      if Session::remove(&session_path)? {
        println!("Logged out");
      } else {
        println!("No active session");
      }
    }
    command => {
      if session.token.is_none() {
        bail!("not logged in; run `pdms login` first");
      }
      run(ApiClient::new(session)?, command).await?;
    }
  }

  Ok(())
}

async fn run(client: ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Save { file, new, sections } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
      let mut payload: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", file.display()))?;
      let Some(obj) = payload.as_object_mut() else {
        bail!("{} must contain a JSON object", file.display());
      };
      if new {
        obj.insert("isNewProgram".into(), json!(true));
      }
      if !sections.is_empty() {
        obj.insert("sectionsToUpdate".into(), json!(sections));
      }

      let body = client.save(&payload).await?;
      println!(
        "{} (version {})",
        body["message"].as_str().unwrap_or_default(),
        body["version"].as_str().unwrap_or_default()
      );
    }
    Command::Versions { code, limit } => {
      let versions = client.versions(&code, limit).await?;
      if versions.is_empty() {
        println!("No versions of {code}");
      }
      for v in versions {
        println!(
          "{:<10} {:<12} {:<8} {}  {}",
          v.pd_version,
          v.status.as_str(),
          v.scheme_year,
          v.created_at.to_rfc3339(),
          v.document_id
        );
      }
    }
    Command::Latest { code } => {
      let doc = client.latest(&code).await?;
      println!("{}", serde_json::to_string_pretty(&doc)?);
    }
    Command::Fetch { id } => {
      let doc = client.fetch(id).await?;
      println!("{}", serde_json::to_string_pretty(&doc)?);
    }
    Command::History => {
      for listing in client.history().await? {
        print_listing(&listing);
      }
    }
    Command::Stats => {
      let dash = client.stats().await?;
      let s = &dash.stats;
      println!(
        "total {}  drafts {}  under review {}  approved {}",
        s.total, s.drafts, s.under_review, s.approved
      );
      for listing in &dash.recent_docs {
        print_listing(listing);
      }
    }
    // Session commands are handled before dispatch.
    Command::Login { .. } | Command::Logout => {}
  }
  Ok(())
}

fn print_listing(l: &DocumentListing) {
  println!(
    "{:<14} {:<10} {:<12} {}",
    l.master.program_code,
    l.master.pd_version,
    l.master.status.as_str(),
    l.program_name
  );
}
