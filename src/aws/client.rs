use aws_sdk_iam::Client;

/// Initialize an AWS IAM client with the default credential provider chain
///
/// This will try to load credentials from:
/// 1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)
/// 2. ~/.aws/credentials and ~/.aws/config (honouring AWS_PROFILE)
/// 3. IAM role (when running on EC2, ECS, Lambda, etc.)
///
/// IAM is a global service, but the region still decides which endpoint
/// partition the requests are signed for.
pub async fn create_iam_client(region: &str) -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_sdk_iam::config::Region::new(region.to_string()))
        .load()
        .await;

    Client::new(&config)
}
