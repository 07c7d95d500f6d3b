use async_trait::async_trait;
use aws_sdk_iam::Client;
use aws_sdk_iam::error::{DisplayErrorContext, SdkError};
use aws_sdk_iam::operation::get_policy::GetPolicyError;
use aws_sdk_iam::operation::get_role::GetRoleError;
use std::fmt;

/// An IAM role as far as setup cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub arn: String,
}

/// A customer managed IAM policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedPolicy {
    pub name: String,
    pub arn: String,
}

/// One page of `ListAttachedRolePolicies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedPoliciesPage {
    pub policies: Vec<AttachedPolicy>,
    pub is_truncated: bool,
    pub marker: Option<String>,
}

/// Input for `CreatePolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPolicy {
    pub name: String,
    pub description: String,
    pub path: String,
    pub document: String,
}

/// IAM failures split the only way setup needs: missing entity or anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IamError {
    NotFound(String),
    Other(String),
}

impl fmt::Display for IamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IamError::NotFound(msg) => write!(f, "not found: {}", msg),
            IamError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IamError {}

/// The IAM operations device fleet setup depends on.
#[async_trait]
pub trait IamApi: Send + Sync {
    async fn get_role(&self, role_name: &str) -> Result<Role, IamError>;

    async fn create_role(
        &self,
        role_name: &str,
        assume_role_policy: &str,
    ) -> Result<Role, IamError>;

    async fn get_policy(&self, policy_arn: &str) -> Result<Policy, IamError>;

    async fn create_policy(&self, policy: &NewPolicy) -> Result<Policy, IamError>;

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<&str>,
        max_items: i32,
    ) -> Result<AttachedPoliciesPage, IamError>;

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), IamError>;
}

fn other<E>(err: SdkError<E>) -> IamError
where
    E: std::error::Error + Send + Sync + 'static,
{
    IamError::Other(DisplayErrorContext(&err).to_string())
}

/// Sort an SDK failure into NotFound when `is_missing` recognises the service error.
fn classify<E>(err: SdkError<E>, what: String, is_missing: fn(&E) -> bool) -> IamError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if err.as_service_error().is_some_and(is_missing) {
        IamError::NotFound(what)
    } else {
        other(err)
    }
}

fn missing(what: &str) -> IamError {
    IamError::Other(format!("IAM response did not include {}", what))
}

fn role_from_sdk(role: &aws_sdk_iam::types::Role) -> Role {
    Role {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
    }
}

fn policy_from_sdk(policy: &aws_sdk_iam::types::Policy) -> Result<Policy, IamError> {
    Ok(Policy {
        name: policy
            .policy_name()
            .ok_or_else(|| missing("a policy name"))?
            .to_string(),
        arn: policy.arn().ok_or_else(|| missing("a policy arn"))?.to_string(),
    })
}

#[async_trait]
impl IamApi for Client {
    async fn get_role(&self, role_name: &str) -> Result<Role, IamError> {
        let response = self
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                classify(
                    e,
                    format!("role {}", role_name),
                    GetRoleError::is_no_such_entity_exception,
                )
            })?;

        response
            .role()
            .map(role_from_sdk)
            .ok_or_else(|| missing("a role"))
    }

    async fn create_role(
        &self,
        role_name: &str,
        assume_role_policy: &str,
    ) -> Result<Role, IamError> {
        let response = self
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(assume_role_policy)
            .send()
            .await
            .map_err(other)?;

        response
            .role()
            .map(role_from_sdk)
            .ok_or_else(|| missing("a role"))
    }

    async fn get_policy(&self, policy_arn: &str) -> Result<Policy, IamError> {
        let response = self
            .get_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                classify(
                    e,
                    format!("policy {}", policy_arn),
                    GetPolicyError::is_no_such_entity_exception,
                )
            })?;

        response
            .policy()
            .ok_or_else(|| missing("a policy"))
            .and_then(policy_from_sdk)
    }

    async fn create_policy(&self, policy: &NewPolicy) -> Result<Policy, IamError> {
        let response = self
            .create_policy()
            .policy_name(&policy.name)
            .description(&policy.description)
            .path(&policy.path)
            .policy_document(&policy.document)
            .send()
            .await
            .map_err(other)?;

        response
            .policy()
            .ok_or_else(|| missing("a policy"))
            .and_then(policy_from_sdk)
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<&str>,
        max_items: i32,
    ) -> Result<AttachedPoliciesPage, IamError> {
        let response = self
            .list_attached_role_policies()
            .role_name(role_name)
            .max_items(max_items)
            .set_marker(marker.map(str::to_string))
            .send()
            .await
            .map_err(other)?;

        let policies = response
            .attached_policies()
            .iter()
            .filter_map(|p| {
                Some(AttachedPolicy {
                    name: p.policy_name()?.to_string(),
                    arn: p.policy_arn().unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(AttachedPoliciesPage {
            policies,
            is_truncated: response.is_truncated(),
            marker: response.marker().map(str::to_string),
        })
    }

    async fn attach_role_policy(
        &self,
        role_name: &str,
        policy_arn: &str,
    ) -> Result<(), IamError> {
        self.attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(other)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_iam::types::error::{NoSuchEntityException, ServiceFailureException};
    use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
    use aws_smithy_runtime_api::http::StatusCode;
    use aws_smithy_types::body::SdkBody;

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(StatusCode::try_from(status).unwrap(), SdkBody::empty())
    }

    #[test]
    fn test_no_such_entity_is_not_found() {
        let err = SdkError::service_error(
            GetRoleError::NoSuchEntityException(
                NoSuchEntityException::builder()
                    .message("The role cannot be found")
                    .build(),
            ),
            response(404),
        );

        let classified = classify(
            err,
            "role Sagemaker_MyFleet_role".to_string(),
            GetRoleError::is_no_such_entity_exception,
        );
        assert_eq!(
            classified,
            IamError::NotFound("role Sagemaker_MyFleet_role".to_string())
        );
    }

    #[test]
    fn test_other_service_errors_are_not_not_found() {
        let err = SdkError::service_error(
            GetPolicyError::ServiceFailureException(
                ServiceFailureException::builder()
                    .message("internal failure")
                    .build(),
            ),
            response(500),
        );

        let classified = classify(
            err,
            "policy arn:aws:iam::123456789012:policy/myfleet-policy".to_string(),
            GetPolicyError::is_no_such_entity_exception,
        );
        assert!(matches!(classified, IamError::Other(_)));
    }

    #[test]
    fn test_transport_errors_are_not_not_found() {
        let err: SdkError<GetRoleError> = SdkError::timeout_error("connect timed out");

        let classified = classify(
            err,
            "role r".to_string(),
            GetRoleError::is_no_such_entity_exception,
        );
        assert!(matches!(classified, IamError::Other(_)));
    }
}
