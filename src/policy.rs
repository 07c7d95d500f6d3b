use crate::config::SetupConfig;
use crate::error::SetupError;
use serde::Serialize;
use std::collections::BTreeMap;

pub const POLICY_VERSION: &str = "2012-10-17";

const IOT_CREDENTIALS_SERVICE: &str = "credentials.iot.amazonaws.com";
const IOT_SERVICE: &str = "iot.amazonaws.com";
const SAGEMAKER_SERVICE: &str = "sagemaker.amazonaws.com";

/// An IAM policy document: a version plus an ordered list of statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    version: &'static str,
    statement: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    service: String,
}

/// Condition block keyed by operator, then by condition key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Condition(BTreeMap<String, BTreeMap<String, Vec<String>>>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    effect: Effect,
    action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resource: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    principal: Option<Principal>,
}

impl Statement {
    pub fn allow<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sid: None,
            effect: Effect::Allow,
            action: actions.into_iter().map(Into::into).collect(),
            resource: Vec::new(),
            condition: None,
            principal: None,
        }
    }

    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn service_principal(mut self, service: impl Into<String>) -> Self {
        self.principal = Some(Principal {
            service: service.into(),
        });
        self
    }

    pub fn condition<I, S>(mut self, operator: &str, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let condition = self.condition.get_or_insert_with(Condition::default);
        condition.0.entry(operator.to_string()).or_default().insert(
            key.to_string(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statement,
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statement
    }

    /// Pretty-printed JSON, as sent to IAM.
    pub fn to_json(&self) -> Result<String, SetupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Trust policy letting IoT credentials and SageMaker assume the fleet role.
pub fn trust_policy() -> PolicyDocument {
    PolicyDocument::new(vec![
        Statement::allow(["sts:AssumeRole"]).service_principal(IOT_CREDENTIALS_SERVICE),
        Statement::allow(["sts:AssumeRole"]).service_principal(SAGEMAKER_SERVICE),
    ])
}

/// Upload access to the fleet's data bucket.
pub fn bucket_policy(config: &SetupConfig) -> PolicyDocument {
    let bucket = &config.device_fleet_bucket;

    PolicyDocument::new(vec![
        Statement::allow(["s3:PutObject", "s3:GetBucketLocation"])
            .sid("DeviceS3Access")
            .resources([
                format!("arn:aws:s3:::{}/*", bucket),
                format!("arn:aws:s3:::{}", bucket),
            ]),
    ])
}

/// Device fleet registration, IoT role alias management and role passing.
pub fn fleet_policy(config: &SetupConfig) -> PolicyDocument {
    let fleet_arn = format!(
        "arn:aws:sagemaker:{}:{}:device-fleet/{}",
        config.region,
        config.account,
        config.fleet_name_lower()
    );
    let role_alias_arn = format!(
        "arn:aws:iot:{}:{}:rolealias/SageMakerEdge-{}",
        config.region, config.account, config.device_fleet
    );
    let role_arn = config.role_arn();

    PolicyDocument::new(vec![
        Statement::allow(["sagemaker:SendHeartbeat", "sagemaker:GetDeviceRegistration"])
            .sid("SageMakerEdgeApis")
            .resources([format!("{}/device/*", fleet_arn), fleet_arn]),
        Statement::allow([
            "iot:CreateRoleAlias",
            "iot:DescribeRoleAlias",
            "iot:UpdateRoleAlias",
            "iot:ListTagsForResource",
            "iot:TagResource",
        ])
        .sid("CreateIOTRoleAlias")
        .resources([role_alias_arn]),
        Statement::allow(["iam:GetRole"])
            .sid("CreateIoTRoleAliasIamPermissionsGetRole")
            .resources([role_arn.clone()]),
        Statement::allow(["iam:PassRole"])
            .sid("CreateIoTRoleAliasIamPermissionsPassRole")
            .resources([role_arn])
            .condition(
                "StringEqualsIfExists",
                "iam:PassedToService",
                [IOT_SERVICE, IOT_CREDENTIALS_SERVICE],
            ),
    ])
}
