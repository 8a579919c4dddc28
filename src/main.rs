// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use multicluster::config::{PollConfig, ReconciliationRequest};
use multicluster::constants::operator;
use multicluster::kubernetes::{load_kubeconfig, member_api_server_urls, ClusterClients};
use multicluster::provision::{ensure_multi_cluster_resources, publish_member_list};

/// Configure service accounts, roles and credentials so an operator in a
/// central cluster can manage workloads in member clusters
#[derive(Parser, Debug)]
#[command(name = "multicluster", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set up the multi-cluster environment
    Setup(CommonArgs),
    /// Reconfigure the environment after a member cluster failure, copying
    /// database roles from a healthy member cluster
    Recover(RecoverArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Comma separated list of member clusters
    #[arg(long, value_delimiter = ',', required = true)]
    member_clusters: Vec<String>,

    /// Service account the operator uses to talk to the member clusters
    #[arg(long, default_value = operator::DEFAULT_SERVICE_ACCOUNT)]
    service_account: String,

    /// The central cluster the operator is deployed in
    #[arg(long)]
    central_cluster: String,

    /// Namespace the member cluster resources are deployed to
    #[arg(long)]
    member_cluster_namespace: String,

    /// Namespace the operator is deployed to
    #[arg(long)]
    central_cluster_namespace: String,

    /// Delete all previously created resources except for namespaces
    #[arg(long)]
    cleanup: bool,

    /// Create ClusterRoles and ClusterRoleBindings in member clusters
    #[arg(long)]
    cluster_scoped: bool,

    /// Install the service accounts and roles database workloads need in member clusters
    #[arg(long)]
    install_database_roles: bool,

    /// Create service account token secrets
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    create_service_account_secrets: bool,

    /// Comma separated list of api server addresses, defaults to the kubeconfig entries
    #[arg(long, value_delimiter = ',')]
    member_clusters_api_servers: Vec<String>,

    /// Secret set as imagePullSecrets on created service accounts
    #[arg(long)]
    image_pull_secrets: Option<String>,
}

#[derive(Args, Debug)]
struct RecoverArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Healthy member cluster that is the source of truth for the new configuration
    #[arg(long)]
    source_cluster: String,
}

impl CommonArgs {
    fn into_request(self, source_cluster: Option<String>, poll: PollConfig) -> ReconciliationRequest {
        ReconciliationRequest {
            member_clusters: self.member_clusters,
            member_api_servers: self.member_clusters_api_servers,
            central_cluster: self.central_cluster,
            service_account: self.service_account,
            central_namespace: self.central_cluster_namespace,
            member_namespace: self.member_cluster_namespace,
            cluster_scoped: self.cluster_scoped,
            cleanup: self.cleanup,
            install_database_roles: self.install_database_roles,
            source_cluster,
            create_service_account_secrets: self.create_service_account_secrets,
            image_pull_secret: self.image_pull_secrets.filter(|s| !s.trim().is_empty()),
            poll,
        }
    }
}

/// Cancel `token` on SIGINT or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    let terminate = async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Cannot listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
        #[cfg(not(unix))]
        std::future::pending::<()>().await;
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, cancelling"),
        _ = terminate => info!("Received SIGTERM, cancelling"),
    }
    token.cancel();
}

async fn run(mut request: ReconciliationRequest, cancel: &CancellationToken) -> Result<()> {
    let kubeconfig = load_kubeconfig()?;
    if request.member_api_servers.is_empty() {
        request.member_api_servers = member_api_server_urls(&kubeconfig, &request.member_clusters)?;
    }
    request.validate()?;

    let clients = ClusterClients::from_kubeconfig(&kubeconfig, &request.all_clusters()).await?;

    ensure_multi_cluster_resources(&clients, &request, cancel).await?;
    publish_member_list(&clients, &request).await?;

    info!(
        "Ensured multi-cluster resources for members [{}] in central cluster {}",
        request.member_clusters.join(", "),
        request.central_cluster
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let poll = PollConfig::from_env()?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let request = match cli.command {
        Command::Setup(args) => {
            info!("Setting up multi-cluster environment");
            args.into_request(None, poll)
        }
        Command::Recover(args) => {
            info!("Recovering multi-cluster environment from {}", args.source_cluster);
            args.common.into_request(Some(args.source_cluster), poll)
        }
    };

    run(request, &cancel).await
}
