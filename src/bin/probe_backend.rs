//! Checks which API prefix a backend answers on and whether image keys presign.
//!
//! ```text
//! probe-backend --backend-url http://localhost:8000 --path /products?limit=1 --image-key products/abc.jpg
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use wearsearch_edge::domain::ports::ConfigProvider;
use wearsearch_edge::utils::logger;
use wearsearch_edge::{BackendClient, CacheSettings, EdgeConfig, HttpPresigner, PresignedImageCache};

#[derive(Debug, Parser)]
#[command(name = "probe-backend")]
#[command(about = "Probe the Wearsearch backend through the API prefix fallback")]
struct Args {
    /// Backend origin (BACKEND_URL is used when omitted)
    #[arg(long)]
    backend_url: Option<String>,

    /// Sub-path to GET under each prefix; may be repeated
    #[arg(long = "path")]
    paths: Vec<String>,

    /// Storage key to presign; may be repeated
    #[arg(long = "image-key")]
    image_keys: Vec<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let mut config = EdgeConfig::from_env().context("reading environment configuration")?;
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }

    if args.paths.is_empty() && args.image_keys.is_empty() {
        bail!("nothing to probe: pass --path and/or --image-key");
    }

    let backend = BackendClient::from_config(&config).context("building backend client")?;
    println!("🔍 Backend: {}", backend.base_url());
    println!("   Prefixes: {}", backend.prefixes().join(", "));

    let mut failures = 0;

    for path in &args.paths {
        println!("\n📡 GET {}", path);
        for candidate in backend.candidate_urls(path) {
            println!("   candidate: {}", candidate);
        }
        match backend.fetch_json::<serde_json::Value>(path).await {
            Some(body) => {
                let preview = serde_json::to_string(&body)?;
                let preview: String = preview.chars().take(200).collect();
                println!("   ✅ {}", preview);
            }
            None => {
                failures += 1;
                println!("   ❌ no prefix returned usable JSON");
            }
        }
    }

    if !args.image_keys.is_empty() {
        let presigner = HttpPresigner::new(backend.clone(), config.image_presign_path());
        let cache = PresignedImageCache::new(presigner, CacheSettings::from_config(&config));

        println!("\n🖼️  Presigning {} key(s)", args.image_keys.len());
        for key in &args.image_keys {
            match cache.resolve_entry(key).await {
                Some(entry) => println!("   ✅ {} -> {} (expires {})", key, entry.url, entry.expires_at),
                None => {
                    failures += 1;
                    println!("   ❌ {} could not be presigned", key);
                }
            }
        }
        tracing::debug!("Cache stats: {:?}", cache.stats());
    }

    if failures > 0 {
        bail!("{} probe(s) failed", failures);
    }
    println!("\n✅ All probes succeeded");
    Ok(())
}
