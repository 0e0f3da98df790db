//! Shapes of the AWS CLI JSON responses we read.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCallerIdentityResponse {
    pub account: String,
    pub arn: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulatePolicyResponse {
    #[serde(default)]
    pub evaluation_results: Vec<RawEvaluationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEvaluationResult {
    pub eval_action_name: String,
    #[serde(default)]
    pub eval_resource_name: Option<String>,
    pub eval_decision: String,
    #[serde(default)]
    pub organizations_decision_detail: Option<OrganizationsDecisionDetail>,
    #[serde(default)]
    pub permissions_boundary_decision_detail: Option<PermissionsBoundaryDecisionDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationsDecisionDetail {
    #[serde(default = "allowed")]
    pub allowed_by_organizations: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionsBoundaryDecisionDetail {
    #[serde(default = "allowed")]
    pub allowed_by_permissions_boundary: bool,
}

fn allowed() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simulation_response() {
        let json = r#"{
            "EvaluationResults": [
                {
                    "EvalActionName": "iam:CreateRole",
                    "EvalResourceName": "arn:aws:iam::123456789012:role/app",
                    "EvalDecision": "implicitDeny",
                    "MatchedStatements": [],
                    "MissingContextValues": [],
                    "OrganizationsDecisionDetail": {"AllowedByOrganizations": false}
                },
                {
                    "EvalActionName": "sqs:CreateQueue",
                    "EvalResourceName": "*",
                    "EvalDecision": "allowed"
                }
            ]
        }"#;

        let response: SimulatePolicyResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.evaluation_results.len(), 2);
        let denied = &response.evaluation_results[0];
        assert_eq!(denied.eval_decision, "implicitDeny");
        assert!(
            !denied
                .organizations_decision_detail
                .as_ref()
                .unwrap()
                .allowed_by_organizations
        );
        assert!(response.evaluation_results[1].permissions_boundary_decision_detail.is_none());
    }

    #[test]
    fn parse_caller_identity() {
        let json = r#"{"UserId": "AIDAEXAMPLE", "Account": "123456789012", "Arn": "arn:aws:iam::123456789012:user/dev"}"#;
        let identity: GetCallerIdentityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(identity.account, "123456789012");
        assert_eq!(identity.arn, "arn:aws:iam::123456789012:user/dev");
    }
}
