use std::process::ExitCode;

use clap::Parser;
use cfn_preflight::{
    analysis::{AnalysisInput, TemplateAnalyzer},
    aws::{
        AwsCli, check_prerequisites, context_entries, list_profiles, simulate_permissions,
    },
    capability::CapabilityTable,
    cli::Cli,
    config::{Config, DEFAULT_REGION, PLACEHOLDER_ACCOUNT_ID},
    logging::init_logging,
    output::{OutputWriter, RemediationPolicy, RunReport, report},
    resolve::Identity,
    template::TemplateLoader,
};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color);

    let config = Config::from_cli(cli)?;

    log::debug!("Template: {}", config.template_file.display());
    for (name, value) in config.masked_parameters() {
        log::debug!("Parameter {} = {}", name, value);
    }

    let capabilities = CapabilityTable::load(config.capabilities_file.as_deref())?;
    log::debug!("Capability table has {} entries", capabilities.len());

    let loader = TemplateLoader::new();
    let analyzer = TemplateAnalyzer::new(&capabilities);
    let writer = OutputWriter::new(
        config.output_format,
        config.output_dir.clone(),
        config.no_color,
    );

    if config.analyze_only {
        let identity = Identity::new(
            config
                .account_id
                .as_deref()
                .unwrap_or(PLACEHOLDER_ACCOUNT_ID),
            config.region.as_deref().unwrap_or(DEFAULT_REGION),
        );
        let result = analyzer.analyze_file(&loader, &config.template_file, &input(&config, identity))?;
        writer.write_analysis(&result)?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(profile) = &config.profile {
        if let Some(home) = dirs::home_dir() {
            if !list_profiles(&home).contains(profile) {
                log::warn!("AWS profile '{}' is not configured in ~/.aws", profile);
            }
        }
    }

    let aws = AwsCli::new(config.profile.clone(), config.region.clone())?;
    if let Some(profile) = aws.profile() {
        log::info!("Using AWS profile '{}'", profile);
    }

    let (account_id, principal_arn) = match (&config.account_id, &config.principal_arn) {
        (Some(account_id), Some(principal_arn)) => (account_id.clone(), principal_arn.clone()),
        (account_id, principal_arn) => {
            let caller = aws.caller_identity()?;
            log::info!("Caller identity: {}", caller.arn);
            (
                account_id.clone().unwrap_or(caller.account_id),
                principal_arn.clone().unwrap_or(caller.arn),
            )
        }
    };
    let region = config
        .region
        .clone()
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let identity = Identity::new(account_id.as_str(), region.as_str());
    let analysis = analyzer.analyze_file(&loader, &config.template_file, &input(&config, identity))?;

    if !analysis.unmapped_types.is_empty() {
        log::warn!(
            "{} resource types have no capability entry",
            analysis.unmapped_types.len()
        );
    }

    let prerequisites = check_prerequisites(&aws, &analysis.prerequisite_checks);
    writer.write_prerequisites(&prerequisites)?;

    let simulation = simulate_permissions(
        &aws,
        &principal_arn,
        &analysis.actions,
        &analysis.resource_arns,
        &context_entries(&config.parameters),
    )?;
    writer.write_simulation(&simulation)?;

    let name = config
        .template_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string());

    if !simulation.all_allowed {
        let policy = RemediationPolicy::from_failures(simulation.failures());
        writer.write_policy(&name, &policy)?;
    }

    let passed = simulation.all_allowed && prerequisites.iter().all(|outcome| outcome.passed());

    let report = RunReport {
        generated_at: report::timestamp(),
        template_file: &config.template_file,
        principal_arn: Some(principal_arn.as_str()),
        account_id: account_id.as_str(),
        region: region.as_str(),
        parameters: config.masked_parameters(),
        analysis: &analysis,
        prerequisites: &prerequisites,
        simulation: Some(&simulation),
        passed,
    };
    writer.write_report(&name, &report)?;

    if passed {
        log::info!("Pre-flight checks passed");
        Ok(ExitCode::SUCCESS)
    } else {
        log::error!("Pre-flight checks failed");
        Ok(ExitCode::FAILURE)
    }
}

fn input(config: &Config, identity: Identity) -> AnalysisInput {
    AnalysisInput {
        parameters: config.parameters.clone(),
        identity,
        condition_overrides: config.condition_overrides.clone(),
    }
}
