use crate::aws::iam::{IamApi, IamError, NewPolicy, Policy, Role};
use crate::config::SetupConfig;
use crate::error::SetupError;
use crate::policy::{self, PolicyDocument};
use std::fmt;
use std::future::Future;

/// Page size used when listing a role's attached policies.
pub const MAX_ITEMS: i32 = 100;

const POLICY_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Role,
    Policy,
}

impl ResourceKind {
    fn get_operation(self) -> &'static str {
        match self {
            ResourceKind::Role => "get role",
            ResourceKind::Policy => "get policy",
        }
    }

    fn create_operation(self) -> &'static str {
        match self {
            ResourceKind::Role => "create role",
            ResourceKind::Policy => "create policy",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::Role => write!(f, "role"),
            ResourceKind::Policy => write!(f, "policy"),
        }
    }
}

/// A resolved resource and whether this run had to create it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured<T> {
    pub resource: T,
    pub created: bool,
}

/// A customer managed policy the fleet role needs.
#[derive(Debug, Clone)]
pub struct PolicySpec {
    pub name: String,
    pub description: String,
    pub document: PolicyDocument,
}

impl PolicySpec {
    pub fn fleet(config: &SetupConfig) -> Self {
        Self {
            name: config.fleet_policy_name(),
            description: format!("SageMaker device fleet policy for {}", config.device_fleet),
            document: policy::fleet_policy(config),
        }
    }

    pub fn bucket(config: &SetupConfig) -> Self {
        Self {
            name: config.bucket_policy_name(),
            description: format!(
                "SageMaker device fleet bucket policy for {}",
                config.device_fleet
            ),
            document: policy::bucket_policy(config),
        }
    }
}

/// End state of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub role: Role,
    pub fleet_policy: Policy,
    pub bucket_policy: Policy,
    /// Names of resources created by this run.
    pub created: Vec<String>,
    /// Names of policies attached by this run.
    pub attached: Vec<String>,
}

/// Look a resource up, creating it only when IAM reports it missing.
async fn ensure_resource<T, L, LF, C, CF>(
    kind: ResourceKind,
    name: &str,
    lookup: L,
    create: C,
) -> Result<Ensured<T>, SetupError>
where
    L: FnOnce() -> LF,
    LF: Future<Output = Result<T, IamError>>,
    C: FnOnce() -> CF,
    CF: Future<Output = Result<T, SetupError>>,
{
    match lookup().await {
        Ok(resource) => {
            tracing::debug!("{} {} already exists", kind, name);
            Ok(Ensured {
                resource,
                created: false,
            })
        }
        Err(IamError::NotFound(_)) => {
            tracing::info!("{} {} doesn't exist, creating it", kind, name);
            let resource = create().await?;
            Ok(Ensured {
                resource,
                created: true,
            })
        }
        Err(e) => Err(SetupError::aws(kind.get_operation(), name, e)),
    }
}

/// Resolve the fleet role, creating it with the fleet trust policy if absent.
pub async fn ensure_role(
    client: &dyn IamApi,
    role_name: &str,
) -> Result<Ensured<Role>, SetupError> {
    ensure_resource(
        ResourceKind::Role,
        role_name,
        move || client.get_role(role_name),
        move || async move {
            let trust = policy::trust_policy().to_json()?;
            client.create_role(role_name, &trust).await.map_err(|e| {
                SetupError::aws(ResourceKind::Role.create_operation(), role_name, e)
            })
        },
    )
    .await
}

/// Resolve a policy by its derived ARN, creating it if absent.
///
/// An existing policy is returned as-is; its document is never compared or updated.
pub async fn ensure_policy(
    client: &dyn IamApi,
    config: &SetupConfig,
    spec: &PolicySpec,
) -> Result<Ensured<Policy>, SetupError> {
    let policy_arn = config.policy_arn(&spec.name);
    let policy_arn = policy_arn.as_str();

    ensure_resource(
        ResourceKind::Policy,
        &spec.name,
        move || client.get_policy(policy_arn),
        move || async move {
            let request = NewPolicy {
                name: spec.name.clone(),
                description: spec.description.clone(),
                path: POLICY_PATH.to_string(),
                document: spec.document.to_json()?,
            };
            tracing::debug!(
                "policy {} has {} statements",
                spec.name,
                spec.document.statements().len()
            );
            client.create_policy(&request).await.map_err(|e| {
                SetupError::aws(ResourceKind::Policy.create_operation(), &spec.name, e)
            })
        },
    )
    .await
}

/// Whether a policy with this name is attached to the role, following every page.
pub async fn is_attached(
    client: &dyn IamApi,
    role_name: &str,
    policy_name: &str,
) -> Result<bool, SetupError> {
    let mut marker: Option<String> = None;

    loop {
        let page = client
            .list_attached_role_policies(role_name, marker.as_deref(), MAX_ITEMS)
            .await
            .map_err(|e| SetupError::aws("list attached role policies", role_name, e))?;

        if let Some(found) = page.policies.iter().find(|p| p.name == policy_name) {
            tracing::debug!("{} is attached to {} as {}", policy_name, role_name, found.arn);
            return Ok(true);
        }

        match (page.is_truncated, page.marker) {
            (true, Some(next)) => marker = Some(next),
            _ => return Ok(false),
        }
    }
}

pub async fn attach_policy(
    client: &dyn IamApi,
    role: &Role,
    policy_arn: &str,
) -> Result<(), SetupError> {
    client
        .attach_role_policy(&role.name, policy_arn)
        .await
        .map_err(|e| {
            SetupError::aws(
                "attach role policy",
                format!("{} on role {}", policy_arn, role.name),
                e,
            )
        })
}

/// Bring the fleet role and both policies to their attached end state.
pub async fn provision(
    client: &dyn IamApi,
    config: &SetupConfig,
) -> Result<ProvisionOutcome, SetupError> {
    let mut created = Vec::new();
    let mut attached = Vec::new();

    let role = ensure_role(client, &config.device_fleet_role).await?;
    if role.created {
        created.push(role.resource.name.clone());
    }
    let role = role.resource;

    let fleet_policy = ensure_policy(client, config, &PolicySpec::fleet(config)).await?;
    let bucket_policy = ensure_policy(client, config, &PolicySpec::bucket(config)).await?;
    for policy in [&fleet_policy, &bucket_policy] {
        if policy.created {
            created.push(policy.resource.name.clone());
        }
    }
    let fleet_policy = fleet_policy.resource;
    let bucket_policy = bucket_policy.resource;

    for policy in [&fleet_policy, &bucket_policy] {
        if is_attached(client, &role.name, &policy.name).await? {
            tracing::debug!("policy {} already attached to {}", policy.name, role.name);
            continue;
        }

        tracing::info!("Attaching policy {} to role {}", policy.name, role.name);
        attach_policy(client, &role, &policy.arn).await?;
        attached.push(policy.name.clone());
    }

    Ok(ProvisionOutcome {
        role,
        fleet_policy,
        bucket_policy,
        created,
        attached,
    })
}
