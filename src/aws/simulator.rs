//! IAM policy simulation.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::Serialize;

use super::json_types::{RawEvaluationResult, SimulatePolicyResponse};
use super::{AwsCli, AwsError, ContextEntry};

/// Services whose actions are all simulated against `*`.
const GLOBAL_SERVICES: &[&str] = &["cloudformation", "sts"];

/// Individual actions simulated against `*`.
const GLOBAL_ACTIONS: &[(&str, &[&str])] = &[
    ("apigateway", &["GET", "POST", "PUT", "PATCH", "DELETE"]),
    ("cloudwatch", &["PutMetricData", "GetMetricStatistics", "ListMetrics"]),
    ("dynamodb", &["ListTables", "CreateTable"]),
    (
        "ec2",
        &[
            "DescribeInstances",
            "DescribeSecurityGroups",
            "DescribeVpcs",
            "DescribeSubnets",
            "DescribeRouteTables",
            "DescribeNetworkInterfaces",
            "CreateSecurityGroup",
            "CreateVpc",
            "CreateSubnet",
            "CreateRouteTable",
            "CreateNetworkInterface",
        ],
    ),
    ("ecr", &["GetAuthorizationToken", "DescribeRepositories", "CreateRepository"]),
    ("ecs", &["ListClusters", "ListServices", "CreateCluster", "CreateService"]),
    ("events", &["PutRule", "ListRules", "DescribeRule"]),
    (
        "iam",
        &[
            "GetUser",
            "ListUsers",
            "ListRoles",
            "GetAccountSummary",
            "CreateRole",
            "CreatePolicy",
            "CreateUser",
            "ListPolicies",
            "ListGroups",
            "CreateGroup",
        ],
    ),
    ("kms", &["CreateKey", "ListKeys", "ListAliases", "CreateAlias", "CreateGrant"]),
    ("lambda", &["ListFunctions", "CreateFunction", "GetAccountSettings"]),
    (
        "logs",
        &["CreateLogGroup", "CreateLogStream", "DescribeLogGroups", "DescribeLogStreams"],
    ),
    (
        "rds",
        &["DescribeDBInstances", "DescribeDBClusters", "CreateDBInstance", "CreateDBCluster"],
    ),
    ("s3", &["ListAllMyBuckets", "CreateBucket", "ListBuckets"]),
    (
        "sns",
        &["CreateTopic", "ListTopics", "ListSubscriptions", "SetSubscriptionAttributes", "Unsubscribe"],
    ),
    ("sqs", &["CreateQueue", "ListQueues", "GetQueueUrl"]),
];

/// Action name prefixes simulated against `*` for services not listed above.
const GLOBAL_ACTION_PREFIXES: &[&str] = &["Create", "List", "Describe"];

/// Outcome of simulating one action on one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Allowed,
    ExplicitDeny,
    ImplicitDeny,
}

impl Decision {
    fn parse(value: &str) -> Self {
        match value {
            "allowed" => Decision::Allowed,
            "explicitDeny" => Decision::ExplicitDeny,
            _ => Decision::ImplicitDeny,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::ExplicitDeny => "explicitDeny",
            Decision::ImplicitDeny => "implicitDeny",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub action: String,
    pub resource: String,
    pub decision: Decision,
    pub denied_by_organizations: bool,
    pub denied_by_permissions_boundary: bool,
    /// Why the action could not be simulated, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allowed
    }

    fn from_raw(raw: RawEvaluationResult) -> Self {
        Self {
            decision: Decision::parse(&raw.eval_decision),
            resource: raw.eval_resource_name.unwrap_or_else(|| "*".to_string()),
            action: raw.eval_action_name,
            denied_by_organizations: raw
                .organizations_decision_detail
                .is_some_and(|detail| !detail.allowed_by_organizations),
            denied_by_permissions_boundary: raw
                .permissions_boundary_decision_detail
                .is_some_and(|detail| !detail.allowed_by_permissions_boundary),
            error: None,
        }
    }

    /// An action that could not be simulated counts as implicitly denied.
    fn simulation_error(action: &str, error: &AwsError) -> Self {
        Self {
            action: action.to_string(),
            resource: "*".to_string(),
            decision: Decision::ImplicitDeny,
            denied_by_organizations: false,
            denied_by_permissions_boundary: false,
            error: Some(error.to_string()),
        }
    }
}

/// Result of simulating every required action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationOutcome {
    pub all_allowed: bool,
    pub results: Vec<EvaluationResult>,
}

impl SimulationOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|result| !result.is_allowed())
    }
}

/// Evaluates whether a principal may perform an action.
pub trait PolicySimulator {
    /// Simulates `action` for `principal_arn` on each of `resource_arns`.
    fn simulate(
        &self,
        principal_arn: &str,
        action: &str,
        resource_arns: &[String],
        context: &[ContextEntry],
    ) -> Result<Vec<EvaluationResult>, AwsError>;
}

impl PolicySimulator for AwsCli {
    fn simulate(
        &self,
        principal_arn: &str,
        action: &str,
        resource_arns: &[String],
        context: &[ContextEntry],
    ) -> Result<Vec<EvaluationResult>, AwsError> {
        let mut args = vec![
            "iam".to_string(),
            "simulate-principal-policy".to_string(),
            "--policy-source-arn".to_string(),
            principal_arn.to_string(),
            "--action-names".to_string(),
            action.to_string(),
            "--resource-arns".to_string(),
        ];
        args.extend(resource_arns.iter().cloned());

        if !context.is_empty() {
            let entries = serde_json::to_string(context)
                .map_err(|e| AwsError::InvalidOutput(e.to_string()))?;
            args.push("--context-entries".to_string());
            args.push(entries);
        }

        let response: SimulatePolicyResponse = self.run_json(&args)?;
        Ok(response
            .evaluation_results
            .into_iter()
            .map(EvaluationResult::from_raw)
            .collect())
    }
}

/// Narrows the run's resource identifiers to those an action applies to.
///
/// Service-wide, create, list and describe actions use `*`. `iam:PassRole`
/// uses role identifiers. Other actions use identifiers of their own
/// service. When nothing matches, `*` is used.
pub fn relevant_resource_arns(action: &str, resource_arns: &BTreeSet<String>) -> Vec<String> {
    let wildcard = || vec!["*".to_string()];

    let Some((service, name)) = action.split_once(':') else {
        return wildcard();
    };

    let is_global = if GLOBAL_SERVICES.contains(&service) {
        true
    } else if let Some((_, actions)) = GLOBAL_ACTIONS.iter().find(|(s, _)| *s == service) {
        actions.contains(&name)
    } else {
        GLOBAL_ACTION_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
    };
    if is_global {
        return wildcard();
    }

    let relevant: Vec<String> = if action == "iam:PassRole" {
        resource_arns
            .iter()
            .filter(|arn| arn.starts_with("arn:aws:iam:") && arn.contains(":role/"))
            .cloned()
            .collect()
    } else {
        let prefix = format!("arn:aws:{}:", service);
        resource_arns
            .iter()
            .filter(|arn| arn.starts_with(&prefix))
            .cloned()
            .collect()
    };

    if relevant.is_empty() { wildcard() } else { relevant }
}

/// Simulates every action, one at a time.
///
/// # Arguments
///
/// * `simulator` - The simulation backend
/// * `principal_arn` - The deploying principal
/// * `actions` - Actions the deployment needs
/// * `resource_arns` - Identifiers the deployment touches
/// * `context` - Context entries passed with every simulation
///
/// # Errors
///
/// Access denied or a missing AWS CLI abort the simulation. Any other failure
/// for a single action is recorded as an implicit denial of that action.
pub fn simulate_permissions(
    simulator: &dyn PolicySimulator,
    principal_arn: &str,
    actions: &BTreeSet<String>,
    resource_arns: &BTreeSet<String>,
    context: &[ContextEntry],
) -> Result<SimulationOutcome, AwsError> {
    info!(
        "Simulating {} actions for {}",
        actions.len(),
        principal_arn
    );

    let mut results = Vec::new();
    for action in actions {
        let resources = relevant_resource_arns(action, resource_arns);
        debug!("Simulating {} on {}", action, resources.join(", "));

        match simulator.simulate(principal_arn, action, &resources, context) {
            Ok(evaluations) => results.extend(evaluations),
            Err(e @ (AwsError::AccessDenied(_) | AwsError::NotFound)) => return Err(e),
            Err(e) => {
                warn!("Could not simulate {}: {}", action, e);
                results.push(EvaluationResult::simulation_error(action, &e));
            }
        }
    }

    let all_allowed = results.iter().all(EvaluationResult::is_allowed);
    Ok(SimulationOutcome {
        all_allowed,
        results,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn arns(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Allows everything except the listed actions.
    struct FakeSimulator {
        denied: Vec<&'static str>,
        failing: Vec<&'static str>,
        access_denied: bool,
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl FakeSimulator {
        fn new() -> Self {
            Self {
                denied: Vec::new(),
                failing: Vec::new(),
                access_denied: false,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl PolicySimulator for FakeSimulator {
        fn simulate(
            &self,
            _principal_arn: &str,
            action: &str,
            resource_arns: &[String],
            _context: &[ContextEntry],
        ) -> Result<Vec<EvaluationResult>, AwsError> {
            self.calls
                .borrow_mut()
                .push((action.to_string(), resource_arns.to_vec()));

            if self.access_denied {
                return Err(AwsError::AccessDenied("AccessDenied".to_string()));
            }
            if self.failing.contains(&action) {
                return Err(AwsError::CommandFailed("Throttling".to_string()));
            }

            let decision = if self.denied.contains(&action) {
                Decision::ImplicitDeny
            } else {
                Decision::Allowed
            };
            Ok(resource_arns
                .iter()
                .map(|resource| EvaluationResult {
                    action: action.to_string(),
                    resource: resource.clone(),
                    decision,
                    denied_by_organizations: false,
                    denied_by_permissions_boundary: false,
                    error: None,
                })
                .collect())
        }
    }

    #[test]
    fn global_actions_use_wildcard() {
        let all = arns(&["arn:aws:iam::123456789012:role/app", "arn:aws:s3:::logs"]);

        assert_eq!(relevant_resource_arns("cloudformation:CreateStack", &all), vec!["*"]);
        assert_eq!(relevant_resource_arns("iam:CreateRole", &all), vec!["*"]);
        assert_eq!(relevant_resource_arns("s3:CreateBucket", &all), vec!["*"]);
        assert_eq!(relevant_resource_arns("cloudtrail:CreateTrail", &all), vec!["*"]);
        assert_eq!(relevant_resource_arns("malformed", &all), vec!["*"]);
    }

    #[test]
    fn service_actions_use_matching_arns() {
        let all = arns(&["arn:aws:iam::123456789012:role/app", "arn:aws:s3:::logs"]);

        assert_eq!(relevant_resource_arns("s3:PutBucketPolicy", &all), vec!["arn:aws:s3:::logs"]);
        assert_eq!(
            relevant_resource_arns("iam:TagRole", &all),
            vec!["arn:aws:iam::123456789012:role/app"]
        );
        assert_eq!(relevant_resource_arns("sqs:TagQueue", &all), vec!["*"]);
    }

    #[test]
    fn pass_role_uses_role_arns() {
        let all = arns(&[
            "arn:aws:iam::123456789012:role/app",
            "arn:aws:iam::123456789012:policy/p",
            "arn:aws:lambda:us-east-1:123456789012:function:f",
        ]);

        assert_eq!(
            relevant_resource_arns("iam:PassRole", &all),
            vec!["arn:aws:iam::123456789012:role/app"]
        );
        assert_eq!(relevant_resource_arns("iam:PassRole", &arns(&[])), vec!["*"]);
    }

    #[test]
    fn all_allowed() {
        let simulator = FakeSimulator::new();
        let outcome = simulate_permissions(
            &simulator,
            "arn:aws:iam::123456789012:role/deployer",
            &arns(&["sqs:CreateQueue", "sqs:TagQueue"]),
            &arns(&["arn:aws:sqs:us-east-1:123456789012:jobs"]),
            &[],
        )
        .unwrap();

        assert!(outcome.all_allowed);
        assert_eq!(outcome.failures().count(), 0);
        assert_eq!(
            simulator.calls.borrow()[1],
            (
                "sqs:TagQueue".to_string(),
                vec!["arn:aws:sqs:us-east-1:123456789012:jobs".to_string()]
            )
        );
    }

    #[test]
    fn denied_actions_are_reported() {
        let mut simulator = FakeSimulator::new();
        simulator.denied = vec!["sqs:TagQueue"];

        let outcome = simulate_permissions(
            &simulator,
            "arn:aws:iam::123456789012:role/deployer",
            &arns(&["sqs:CreateQueue", "sqs:TagQueue"]),
            &arns(&[]),
            &[],
        )
        .unwrap();

        assert!(!outcome.all_allowed);
        let failures: Vec<_> = outcome.failures().map(|r| r.action.as_str()).collect();
        assert_eq!(failures, vec!["sqs:TagQueue"]);
    }

    #[test]
    fn failed_simulation_counts_as_implicit_deny() {
        let mut simulator = FakeSimulator::new();
        simulator.failing = vec!["sqs:CreateQueue"];

        let outcome = simulate_permissions(
            &simulator,
            "arn:aws:iam::123456789012:role/deployer",
            &arns(&["sqs:CreateQueue"]),
            &arns(&[]),
            &[],
        )
        .unwrap();

        assert!(!outcome.all_allowed);
        let failure = outcome.failures().next().unwrap();
        assert_eq!(failure.decision, Decision::ImplicitDeny);
        assert!(failure.error.as_deref().unwrap().contains("Throttling"));
    }

    #[test]
    fn access_denied_aborts() {
        let mut simulator = FakeSimulator::new();
        simulator.access_denied = true;

        let err = simulate_permissions(
            &simulator,
            "arn:aws:iam::123456789012:role/deployer",
            &arns(&["sqs:CreateQueue", "sqs:TagQueue"]),
            &arns(&[]),
            &[],
        )
        .unwrap_err();

        assert!(matches!(err, AwsError::AccessDenied(_)));
        assert_eq!(simulator.calls.borrow().len(), 1);
    }

    #[test]
    fn decisions_parse_from_cli_values() {
        assert_eq!(Decision::parse("allowed"), Decision::Allowed);
        assert_eq!(Decision::parse("explicitDeny"), Decision::ExplicitDeny);
        assert_eq!(Decision::parse("implicitDeny"), Decision::ImplicitDeny);
        assert_eq!(Decision::ImplicitDeny.as_str(), "implicitDeny");
    }
}
