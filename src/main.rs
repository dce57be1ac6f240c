use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use dlang_toolchain::platform::{Arch, Platform};
use dlang_toolchain::resolve::artifact::ArtifactDescriptor;
use dlang_toolchain::resolve::resolvers::{DmdResolver, DubResolver, GdcResolver, LdcResolver};
use dlang_toolchain::resolve::transport::{HttpClient, Transport};

#[derive(Parser)]
#[command(name = "dlang-toolchain")]
#[command(version, about = "Resolve D toolchain version specifiers into download artifacts")]
struct Cli {
    /// Compiler specifier, e.g. dmd-latest, dmd^2, ldc-1.39, gdc-12
    compiler: String,

    /// Also resolve this dub version (e.g. latest, v1.38.1)
    #[arg(long)]
    dub: Option<String>,

    /// gdmd commit identifier; required for gdc specifiers
    #[arg(long)]
    gdmd_commit: Option<String>,

    /// GitHub API token for tag and release lookups
    #[arg(long)]
    token: Option<String>,

    /// Target platform: linux, windows or macos (defaults to the host)
    #[arg(long)]
    platform: Option<String>,

    /// Target architecture: x64, arm64, x86 or arm (defaults to the host)
    #[arg(long)]
    arch: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let platform = match &cli.platform {
        Some(name) => name.parse()?,
        None => Platform::host().context("no toolchain archives exist for this host platform")?,
    };
    let arch = match &cli.arch {
        Some(name) => name.parse()?,
        None => Arch::host().context("no toolchain archives exist for this host architecture")?,
    };

    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new());

    info!("resolving '{}' for {}-{}", cli.compiler, platform, arch);
    let compiler = resolve_compiler(&cli, Arc::clone(&transport), platform, arch).await?;
    print_artifact(&compiler)?;

    if let Some(dub_spec) = &cli.dub {
        info!("resolving dub '{}' for {}-{}", dub_spec, platform, arch);
        let dub = DubResolver::new(transport, cli.token.clone())
            .resolve(dub_spec, platform, arch)
            .await?;
        print_artifact(&dub)?;
    }

    Ok(())
}

async fn resolve_compiler(
    cli: &Cli,
    transport: Arc<dyn Transport>,
    platform: Platform,
    arch: Arch,
) -> anyhow::Result<ArtifactDescriptor> {
    let spec = cli.compiler.as_str();
    let artifact = if spec.starts_with("dmd") {
        DmdResolver::new(transport, cli.token.clone())
            .resolve(spec, platform, arch)
            .await?
    } else if spec.starts_with("ldc") || spec.starts_with("wekaldc") {
        LdcResolver::new(transport, cli.token.clone())
            .resolve(spec, platform, arch)
            .await?
    } else if spec.starts_with("gdc") {
        GdcResolver::new().resolve(
            spec,
            cli.gdmd_commit.as_deref().unwrap_or(""),
            platform,
            arch,
        )?
    } else {
        anyhow::bail!("unrecognized compiler specifier: '{}'", spec);
    };
    Ok(artifact)
}

fn print_artifact(artifact: &ArtifactDescriptor) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(artifact)?);
    Ok(())
}
