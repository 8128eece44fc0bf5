//! `idvault`: command-line access to an identity vault.
//!
//! Inspect and extend an identity vault from the command line: unlock it,
//! add keypair or group identities, list and select them.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use identity_vault::config::default_dir;
use identity_vault::crypto::keys::Ed25519KeyPair;
use identity_vault::{
    FileIdentityStore, GroupIdentity, Identity, IdentityPath, IdentityService, KeypairIdentity,
    NoopBroadcaster, VaultConfig,
};

/// Environment variable read before prompting for a passphrase.
const PASSPHRASE_ENV: &str = "IDENTITY_VAULT_PASSPHRASE";

type Vault = IdentityService<FileIdentityStore, NoopBroadcaster>;

// ── Passphrase helper ─────────────────────────────────────────────────────────

fn read_passphrase(prompt: &str) -> Result<String> {
    if let Ok(pass) = std::env::var(PASSPHRASE_ENV) {
        return Ok(pass);
    }
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .context("failed to read passphrase")?;
    Ok(passphrase.trim_end_matches(&['\r', '\n'][..]).to_string())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// idvault: manage keypair and group identities in a passphrase-locked vault.
#[derive(Parser, Debug)]
#[command(name = "idvault", about = "identity-vault CLI", version)]
struct Cli {
    /// Vault directory (default: $IDENTITY_VAULT_DIR or ~/.identity-vault)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the vault store if it does not exist
    Init,

    /// Check a passphrase against every stored keypair
    UnlockCheck,

    /// Add a keypair identity (a fresh Ed25519 key unless --private-key is given)
    AddKeypair {
        #[arg(long)]
        address: String,

        #[arg(long, default_value = "0")]
        nonce: u64,

        /// Hex-encoded 32-byte Ed25519 private key
        #[arg(long)]
        private_key: Option<String>,
    },

    /// Add a group membership identity
    AddGroup {
        #[arg(long)]
        address: String,

        #[arg(long, default_value = "0")]
        nonce: u64,

        #[arg(long)]
        provider: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        commitment: String,

        /// Serialized group identity secret
        #[arg(long)]
        serialized: String,

        /// JSON file holding the Merkle path ({path_elements, path_index, root})
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// List stored identities (secrets are never printed)
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the first identity stored for an address
    Show { address: String },

    /// Select an identity by public key or commitment
    Select {
        key: String,

        /// Print the opened secret
        #[arg(long)]
        reveal: bool,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dir = cli.dir.unwrap_or_else(default_dir);
    let config = VaultConfig::load_from_dir(&dir)
        .with_context(|| format!("loading config from {}", dir.display()))?;
    let mut vault = Vault::from_config(&config, NoopBroadcaster);
    vault
        .start()
        .await
        .with_context(|| format!("opening {}", config.store_path.display()))?;

    match cli.command {
        Commands::Init => {
            println!("Vault ready at {}", config.store_path.display());
            Ok(())
        }
        Commands::UnlockCheck => cmd_unlock_check(&mut vault).await,
        Commands::AddKeypair {
            address,
            nonce,
            private_key,
        } => cmd_add_keypair(&mut vault, address, nonce, private_key).await,
        Commands::AddGroup {
            address,
            nonce,
            provider,
            name,
            commitment,
            serialized,
            path,
        } => {
            let identity_path = match path {
                Some(p) => Some(read_identity_path(&p)?),
                None => None,
            };
            let group = GroupIdentity {
                address,
                nonce,
                provider,
                name,
                identity_commitment: commitment,
                identity_path,
                serialized_identity: serialized,
            };
            unlock(&mut vault).await?;
            vault.add_identity(group.into()).await?;
            println!("Added group identity");
            Ok(())
        }
        Commands::List { json } => cmd_list(&vault, json).await,
        Commands::Show { address } => {
            let identity = vault
                .get_identity_by_address(&address)
                .await?
                .ok_or_else(|| anyhow!("no identity for address {address}"))?;
            print_identity(&identity);
            Ok(())
        }
        Commands::Select { key, reveal } => {
            unlock(&mut vault).await?;
            let identity = vault.select_identity(&key).await?;
            print_identity(&identity);
            if reveal {
                println!("  secret:     {}", identity.secret());
            }
            Ok(())
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn unlock(vault: &mut Vault) -> Result<()> {
    let passphrase = read_passphrase("Passphrase: ")?;
    vault
        .set_passphrase(&passphrase)
        .await
        .context("unlock failed")
}

/// `idvault unlock-check`
async fn cmd_unlock_check(vault: &mut Vault) -> Result<()> {
    unlock(vault).await?;
    let count = vault.get_identities().await?.len();
    println!("Passphrase accepted ({count} identities)");
    Ok(())
}

/// `idvault add-keypair --address ADDR [--nonce N] [--private-key HEX]`
async fn cmd_add_keypair(
    vault: &mut Vault,
    address: String,
    nonce: u64,
    private_key: Option<String>,
) -> Result<()> {
    let keypair = match private_key {
        Some(hex) => {
            let kp = Ed25519KeyPair::from_private_hex(&hex)?;
            KeypairIdentity {
                address,
                nonce,
                public_key: kp.public_key_hex(),
                private_key: kp.private_key_hex().to_string(),
            }
        }
        None => KeypairIdentity::generate(address, nonce),
    };
    let public_key = keypair.public_key.clone();

    unlock(vault).await?;
    vault.add_identity(keypair.into()).await?;
    println!("Added keypair identity {public_key}");
    Ok(())
}

/// `idvault list [--json]`
async fn cmd_list(vault: &Vault, json: bool) -> Result<()> {
    let identities = vault.get_identities().await?;

    if json {
        let public: Vec<Identity> = identities
            .into_iter()
            .map(|id| id.with_secret(String::new()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&public)?);
        return Ok(());
    }

    if identities.is_empty() {
        println!("No identities stored.");
        return Ok(());
    }
    for identity in &identities {
        print_identity(identity);
    }
    Ok(())
}

fn read_identity_path(path: &Path) -> Result<IdentityPath> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let identity_path: IdentityPath = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing identity path {}", path.display()))?;
    identity_path
        .validate()
        .with_context(|| format!("invalid identity path {}", path.display()))?;
    Ok(identity_path)
}

fn print_identity(identity: &Identity) {
    match identity {
        Identity::Keypair(id) => {
            println!("keypair {}", id.public_key);
            println!("  address:    {}", id.address);
            println!("  nonce:      {}", id.nonce);
        }
        Identity::Group(id) => {
            println!("group {}", id.identity_commitment);
            println!("  address:    {}", id.address);
            println!("  nonce:      {}", id.nonce);
            println!("  provider:   {}", id.provider);
            println!("  name:       {}", id.name);
            if let Some(path) = &id.identity_path {
                println!("  root:       {}", path.root);
            }
        }
    }
}
