use crate::Cli;
use crate::error::SetupError;
use crate::platform::{self, TargetPlatform};
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_S3_FOLDER_PREFIX: &str = "demo";
const DEFAULT_AGENT_DIRECTORY: &str = "demo-agent";

// Service limits on names derived from the configuration
const MAX_BUCKET_NAME_LEN: usize = 63;
const MIN_BUCKET_NAME_LEN: usize = 3;
const MAX_ROLE_NAME_LEN: usize = 64;
const MAX_POLICY_NAME_LEN: usize = 128;

/// Validated input for one setup run.
///
/// Every IAM resource name is derived from these fields, so two runs with the
/// same configuration always target the same role and policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    pub account: String,
    pub region: String,
    pub device_fleet: String,
    pub device_name: String,
    pub iot_thing_type: String,
    pub iot_thing_name: String,
    pub device_fleet_role: String,
    pub device_fleet_bucket: String,
    pub s3_folder_prefix: String,
    pub agent_directory: PathBuf,
    pub target_platform: TargetPlatform,
}

impl SetupConfig {
    /// Apply defaults and validation to parsed command line flags.
    pub fn from_args(cli: Cli, cwd: &Path) -> Result<Self, SetupError> {
        let account = required("account", cli.account)?;
        if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
            return Err(SetupError::Config(format!(
                "account '{}' is not a 12 digit AWS account id",
                account
            )));
        }

        let device_fleet = required("device-fleet", cli.device_fleet)?;
        let device_name = required("device-name", cli.device_name)?;

        let region = cli.region.trim().to_lowercase();
        if region.is_empty() {
            return Err(SetupError::Config("region cannot be empty".to_string()));
        }

        let os = cli.os.unwrap_or_else(|| platform::DIST_OS.to_string());
        let arch = cli.arch.unwrap_or_else(|| platform::host_arch().to_string());
        let target_platform =
            TargetPlatform::new(&os, &arch, cli.accelerator.as_deref().unwrap_or(""));
        target_platform.validate()?;

        let iot_thing_type =
            non_empty(cli.iot_thing_type).unwrap_or_else(|| format!("Sagemaker_{}", device_fleet));
        let iot_thing_name =
            non_empty(cli.iot_thing_name).unwrap_or_else(|| format!("Sagemaker_{}", device_name));
        let device_fleet_role = non_empty(cli.device_fleet_role)
            .unwrap_or_else(|| format!("Sagemaker_{}_role", device_fleet));
        let device_fleet_bucket = non_empty(cli.device_fleet_bucket)
            .unwrap_or_else(|| default_bucket_name(&account, &device_fleet));
        let s3_folder_prefix = non_empty(cli.s3_folder_prefix)
            .unwrap_or_else(|| DEFAULT_S3_FOLDER_PREFIX.to_string());
        let agent_directory = cli
            .agent_directory
            .unwrap_or_else(|| cwd.join(DEFAULT_AGENT_DIRECTORY));

        let config = Self {
            account,
            region,
            device_fleet,
            device_name,
            iot_thing_type,
            iot_thing_name,
            device_fleet_role,
            device_fleet_bucket,
            s3_folder_prefix,
            agent_directory,
            target_platform,
        };
        config.validate_name_lengths()?;

        Ok(config)
    }

    fn validate_name_lengths(&self) -> Result<(), SetupError> {
        let bucket_len = self.device_fleet_bucket.len();
        if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&bucket_len) {
            return Err(SetupError::Config(format!(
                "bucket name '{}' must be {} to {} characters; pass a shorter --device-fleet-bucket",
                self.device_fleet_bucket, MIN_BUCKET_NAME_LEN, MAX_BUCKET_NAME_LEN
            )));
        }

        if self.device_fleet_role.len() > MAX_ROLE_NAME_LEN {
            return Err(SetupError::Config(format!(
                "role name '{}' exceeds {} characters; pass a shorter --device-fleet-role",
                self.device_fleet_role, MAX_ROLE_NAME_LEN
            )));
        }

        for policy_name in [self.fleet_policy_name(), self.bucket_policy_name()] {
            if policy_name.len() > MAX_POLICY_NAME_LEN {
                return Err(SetupError::Config(format!(
                    "policy name '{}' exceeds {} characters",
                    policy_name, MAX_POLICY_NAME_LEN
                )));
            }
        }

        Ok(())
    }

    pub fn fleet_name_lower(&self) -> String {
        self.device_fleet.to_lowercase()
    }

    pub fn fleet_policy_name(&self) -> String {
        format!("{}-policy", self.fleet_name_lower())
    }

    pub fn bucket_policy_name(&self) -> String {
        format!(
            "{}-{}-policy",
            self.fleet_name_lower(),
            self.device_fleet_bucket.to_lowercase()
        )
    }

    pub fn policy_arn(&self, policy_name: &str) -> String {
        format!("arn:aws:iam::{}:policy/{}", self.account, policy_name)
    }

    pub fn role_arn(&self) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account, self.device_fleet_role)
    }
}

impl fmt::Display for SetupConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Account: {}", self.account)?;
        writeln!(f, "Region: {}", self.region)?;
        writeln!(f, "DeviceFleet: {}", self.device_fleet)?;
        writeln!(f, "DeviceName: {}", self.device_name)?;
        writeln!(f, "IOT Thing Type: {}", self.iot_thing_type)?;
        writeln!(f, "IOT Thing Name: {}", self.iot_thing_name)?;
        writeln!(f, "Device Fleet Role: {}", self.device_fleet_role)?;
        writeln!(f, "Device Fleet Bucket: {}", self.device_fleet_bucket)?;
        writeln!(f, "S3 Folder Prefix: {}", self.s3_folder_prefix)?;
        writeln!(f, "Agent Directory: {}", self.agent_directory.display())?;
        write!(f, "{}", self.target_platform)
    }
}

fn required(flag: &str, value: Option<String>) -> Result<String, SetupError> {
    non_empty(value).ok_or_else(|| SetupError::Config(format!("--{} is required", flag)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// S3 bucket names only allow lower-case letters, digits, dots and hyphens
fn default_bucket_name(account: &str, device_fleet: &str) -> String {
    format!(
        "sagemaker-edge-{}-{}",
        account,
        device_fleet.to_lowercase().replace('_', "-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Result<SetupConfig, SetupError> {
        parse_fleet("MyFleet", extra)
    }

    fn parse_fleet(fleet: &str, extra: &[&str]) -> Result<SetupConfig, SetupError> {
        let mut argv = vec![
            "edge-device-setup",
            "--account",
            "123456789012",
            "--device-fleet",
            fleet,
            "--device-name",
            "MyDevice",
        ];
        if !extra.contains(&"--os") {
            argv.extend_from_slice(&["--os", "linux", "--arch", "x86_64"]);
        }
        argv.extend_from_slice(extra);
        let cli = Cli::parse_from(argv);
        SetupConfig::from_args(cli, Path::new("/work"))
    }

    #[test]
    fn test_defaults_are_derived() {
        let config = parse(&[]).unwrap();

        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.iot_thing_type, "Sagemaker_MyFleet");
        assert_eq!(config.iot_thing_name, "Sagemaker_MyDevice");
        assert_eq!(config.device_fleet_role, "Sagemaker_MyFleet_role");
        assert_eq!(config.device_fleet_bucket, "sagemaker-edge-123456789012-myfleet");
        assert_eq!(config.s3_folder_prefix, "demo");
        assert_eq!(config.agent_directory, PathBuf::from("/work/demo-agent"));
    }

    #[test]
    fn test_explicit_values_win() {
        let config = parse(&[
            "--region",
            "EU-WEST-1",
            "--device-fleet-role",
            "CustomRole",
            "--device-fleet-bucket",
            "my-bucket",
            "--iot-thing-name",
            "thing-1",
        ])
        .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.device_fleet_role, "CustomRole");
        assert_eq!(config.device_fleet_bucket, "my-bucket");
        assert_eq!(config.iot_thing_name, "thing-1");
    }

    #[test]
    fn test_derived_names_are_lowercased() {
        let config = parse(&["--device-fleet-bucket", "My-Bucket"]).unwrap();

        assert_eq!(config.fleet_policy_name(), "myfleet-policy");
        assert_eq!(config.bucket_policy_name(), "myfleet-my-bucket-policy");
        assert_eq!(
            config.policy_arn(&config.fleet_policy_name()),
            "arn:aws:iam::123456789012:policy/myfleet-policy"
        );
        assert_eq!(
            config.role_arn(),
            "arn:aws:iam::123456789012:role/Sagemaker_MyFleet_role"
        );
    }

    #[test]
    fn test_derived_names_are_stable() {
        let first = parse(&[]).unwrap();
        let second = parse(&[]).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.bucket_policy_name(), second.bucket_policy_name());
    }

    #[test]
    fn test_bad_account_rejected() {
        let cli = Cli::parse_from([
            "edge-device-setup",
            "--account",
            "12345",
            "--device-fleet",
            "MyFleet",
            "--device-name",
            "MyDevice",
        ]);
        let err = SetupConfig::from_args(cli, Path::new("/work")).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }

    #[test]
    fn test_long_fleet_name_overflows_default_bucket() {
        let fleet = "f".repeat(40);
        let err = parse_fleet(&fleet, &["--device-fleet-role", "Role"]).unwrap_err();

        assert!(matches!(err, SetupError::Config(_)));
        assert!(err.to_string().contains("--device-fleet-bucket"));
    }

    #[test]
    fn test_long_fleet_name_with_explicit_bucket() {
        let fleet = "f".repeat(40);
        let config = parse_fleet(
            &fleet,
            &["--device-fleet-role", "Role", "--device-fleet-bucket", "my-bucket"],
        )
        .unwrap();

        assert_eq!(config.device_fleet_bucket, "my-bucket");
    }

    #[test]
    fn test_policy_name_limit_enforced() {
        let fleet = "f".repeat(60);
        let bucket = "b".repeat(63);
        let err = parse_fleet(
            &fleet,
            &["--device-fleet-role", "Role", "--device-fleet-bucket", bucket.as_str()],
        )
        .unwrap_err();

        assert!(matches!(err, SetupError::Config(_)));
        assert!(err.to_string().contains("policy name"));
    }

    #[test]
    fn test_long_role_name_rejected() {
        let role = "r".repeat(65);
        let err = parse(&["--device-fleet-role", role.as_str()]).unwrap_err();
        assert!(err.to_string().contains("--device-fleet-role"));
    }

    #[test]
    fn test_short_bucket_name_rejected() {
        let err = parse(&["--device-fleet-bucket", "ab"]).unwrap_err();
        assert!(err.to_string().contains("3 to 63"));
    }

    #[test]
    fn test_invalid_platform_rejected() {
        let err = parse(&["--os", "windows", "--arch", "arm64"]).unwrap_err();
        assert!(matches!(err, SetupError::InvalidPlatform(_)));
    }

    #[test]
    fn test_summary_lists_fields() {
        let summary = parse(&[]).unwrap().to_string();

        assert!(summary.contains("DeviceFleet: MyFleet"));
        assert!(summary.contains("Device Fleet Role: Sagemaker_MyFleet_role"));
        assert!(summary.contains("\tOs: linux"));
    }
}
