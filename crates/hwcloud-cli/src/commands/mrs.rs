use crate::MrsCommands;
use crate::output;
use anyhow::Context as _;
use colored::Colorize;
use hwcloud_cbc::CbcClient;
use hwcloud_config::ProviderConfig;
use hwcloud_core::{MemberSpec, Orchestrator};
use hwcloud_http::HttpTransport;
use hwcloud_mrs::{
    AddComponents, ClusterRef, ClusterSpec, ClusterType, CreateCluster, DeleteCluster,
    GroupResize, GroupUpdate, MrsClient, NodeLayout, RESIZE_TIMEOUT, ResizeGroup,
    UnsubscribeCluster, plan_node_updates, resize_cluster_nodes,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

struct Session {
    config: ProviderConfig,
    mrs: MrsClient<HttpTransport>,
    billing: Arc<CbcClient<HttpTransport>>,
}

impl Session {
    fn connect() -> anyhow::Result<Self> {
        let config = ProviderConfig::load()?;
        tracing::debug!(region = %config.region, "Loaded provider configuration");

        let mrs = MrsClient::new(HttpTransport::for_service(&config, "mrs")?);
        let billing = Arc::new(CbcClient::new(HttpTransport::for_service(&config, "bss")?));
        Ok(Self {
            config,
            mrs,
            billing,
        })
    }

    fn orchestrator(&self) -> Orchestrator<'static> {
        Orchestrator::new().with_billing(self.billing.clone())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

pub async fn handle(command: MrsCommands) -> anyhow::Result<()> {
    // Planning only needs the layouts, not credentials
    if let MrsCommands::UpdateNodes {
        cluster_type,
        from,
        to,
        dry_run: true,
        ..
    } = &command
    {
        let updates = plan(cluster_type, from, to)?;
        output::print_plan(&updates);
        return Ok(());
    }

    let session = Session::connect()?;

    match command {
        MrsCommands::Show { cluster } => {
            let info = session.mrs.get_cluster(&cluster).await?;
            output::print_cluster(&info);
        }
        MrsCommands::Create { file } => {
            let spec: ClusterSpec = read_json(&file)?;
            println!("Creating cluster {}", spec.cluster_name.cyan());
            let outcome = session
                .orchestrator()
                .execute(
                    &CreateCluster::new(&session.mrs),
                    &spec,
                    session.config.timeouts.create(),
                )
                .await?;
            output::print_outcome(&outcome);
        }
        MrsCommands::Resize {
            cluster,
            group,
            current,
            desired,
            flavor,
            data_volume_type,
            data_volume_size,
            data_volume_count,
        } => {
            let mut update = GroupUpdate::new(group, current, desired);
            if let Some(flavor) = flavor {
                update = update.with_member_spec(MemberSpec {
                    flavor,
                    data_volume_type,
                    data_volume_size,
                    data_volume_count,
                });
            }
            let outcome = session
                .orchestrator()
                .execute(
                    &ResizeGroup::new(&session.mrs),
                    &GroupResize::new(cluster, update),
                    RESIZE_TIMEOUT,
                )
                .await?;
            output::print_outcome(&outcome);
        }
        MrsCommands::UpdateNodes {
            cluster,
            cluster_type,
            from,
            to,
            ..
        } => {
            let updates = plan(&cluster_type, &from, &to)?;
            output::print_plan(&updates);
            let outcomes = resize_cluster_nodes(
                &session.orchestrator(),
                &session.mrs,
                &cluster,
                updates,
                RESIZE_TIMEOUT,
            )
            .await?;
            for outcome in &outcomes {
                output::print_outcome(outcome);
            }
        }
        MrsCommands::AddComponents {
            cluster,
            components,
        } => {
            let outcome = session
                .orchestrator()
                .execute(
                    &AddComponents::new(&session.mrs, &components),
                    &ClusterRef::new(cluster),
                    session.config.timeouts.update(),
                )
                .await?;
            output::print_outcome(&outcome);
        }
        MrsCommands::Delete { cluster, prepaid } => {
            let request = ClusterRef::new(cluster);
            let timeout = session.config.timeouts.delete();
            let orchestrator = session.orchestrator();
            let outcome = if prepaid {
                let strategy = UnsubscribeCluster::new(&session.mrs, session.billing.clone());
                orchestrator.execute(&strategy, &request, timeout).await?
            } else {
                let strategy = DeleteCluster::new(&session.mrs);
                orchestrator.execute(&strategy, &request, timeout).await?
            };
            output::print_outcome(&outcome);
        }
    }

    Ok(())
}

fn plan(cluster_type: &str, from: &Path, to: &Path) -> anyhow::Result<Vec<GroupUpdate>> {
    let cluster_type: ClusterType = cluster_type.parse()?;
    let old: NodeLayout = read_json(from)?;
    let new: NodeLayout = read_json(to)?;
    Ok(plan_node_updates(cluster_type, &old, &new)?)
}
