mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use netventory_audit::{HeuristicAnalyzer, RiskAnalyzer, SecurityAuditor};
use netventory_core::ScanEngine;
use netventory_rules::{DeviceProfileTable, ServiceRuleTable, VersionPatternTable};
use netventory_types::{Device, Intensity, ScanConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing based on verbosity
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ScanConfig {
        target: args.target.clone(),
        intensity: Intensity::from_level(args.timing),
        snmp_community: args.snmp_community.clone(),
    };

    let engine = Arc::new(ScanEngine::with_defaults());

    if !args.json {
        engine.on_device(|device: &Device| {
            eprintln!(
                "  found {} ({}): {} open ports",
                device.address,
                device.hostname,
                device.services.len()
            );
        });
    }

    // Ctrl+C requests a clean stop: kill in-flight probes, keep what finished
    {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupted, stopping scan");
                engine.stop();
            }
        });
    }

    info!(target = %config.target, "starting scan");
    let devices = engine
        .scan(&config)
        .await
        .with_context(|| format!("failed to scan '{}'", config.target))?;

    if args.json {
        print_json(&args, &devices)?;
    } else {
        print_human(&args, &devices);
    }

    Ok(())
}

fn risk_analyzer() -> RiskAnalyzer {
    RiskAnalyzer::new(
        Arc::new(ServiceRuleTable::new()),
        Arc::new(DeviceProfileTable::new()),
        Arc::new(VersionPatternTable::new()),
    )
}

fn print_json(args: &Args, devices: &[Device]) -> Result<()> {
    let mut output = serde_json::json!({ "devices": devices });

    if args.risk {
        let analyzer = risk_analyzer();
        let reports: Vec<serde_json::Value> = devices
            .iter()
            .map(|d| match analyzer.analyze(d) {
                Ok(report) => serde_json::json!({ "address": d.address, "report": report }),
                Err(e) => serde_json::json!({ "address": d.address, "error": e.to_string() }),
            })
            .collect();
        output["risk_reports"] = serde_json::Value::Array(reports);
    }

    if args.summary {
        let auditor = SecurityAuditor::new(Arc::new(ServiceRuleTable::new()));
        let heuristic = HeuristicAnalyzer::new(
            Arc::new(DeviceProfileTable::new()),
            Arc::new(VersionPatternTable::new()),
        );
        output["security_report"] = serde_json::to_value(auditor.security_report(devices))?;
        output["network_insight"] = serde_json::to_value(heuristic.analyze_network(devices))?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_human(args: &Args, devices: &[Device]) {
    if devices.is_empty() {
        println!("No devices found.");
        return;
    }

    let analyzer = args.risk.then(risk_analyzer);

    for device in devices {
        println!();
        println!("Scan report for {} ({})", device.address, device.hostname);
        if let Some(mac) = &device.mac {
            println!(
                "MAC: {mac} ({})",
                device.vendor.as_deref().unwrap_or("unknown vendor")
            );
        }
        println!("OS: {}", device.os);

        if device.services.is_empty() {
            println!("No open ports.");
        } else {
            println!("{:<10} {:<16} VERSION", "PORT", "SERVICE");
            for service in device.services.values() {
                println!(
                    "{:<10} {:<16} {}",
                    format!("{}/{}", service.port, service.protocol),
                    service.name,
                    service.version_display().unwrap_or_default()
                );
            }
        }

        if let Some(level) = device.risk_level {
            println!("Audit: {} (score {})", level, device.risk_score);
            for vuln in &device.vulnerabilities {
                println!("  [{}] {} on port {}", vuln.severity, vuln.name, vuln.port);
            }
        }

        if let Some(analyzer) = &analyzer {
            match analyzer.analyze(device) {
                Ok(report) => {
                    println!(
                        "Risk: {} ({:.1}/10, audit {} / heuristic {})",
                        report.risk_level,
                        report.risk_score,
                        report.security_score,
                        report.ai_score
                    );
                    for rec in &report.recommendations {
                        println!("  - {rec}");
                    }
                }
                Err(e) => println!("Risk analysis failed: {e}"),
            }
        }
    }

    if args.summary {
        let auditor = SecurityAuditor::new(Arc::new(ServiceRuleTable::new()));
        let report = auditor.security_report(devices);
        println!();
        println!("=== Security summary ===");
        println!("Devices scanned: {}", report.total_devices);
        println!("Total findings:  {}", report.total_vulnerabilities);
        println!("Average score:   {:.1}", report.average_risk_score);
        for (level, count) in &report.risk_summary {
            println!("  {level}: {count}");
        }
        if !report.global_recommendations.is_empty() {
            println!("Recommendations:");
            for rec in &report.global_recommendations {
                println!("  - {rec}");
            }
        }

        let heuristic = HeuristicAnalyzer::new(
            Arc::new(DeviceProfileTable::new()),
            Arc::new(VersionPatternTable::new()),
        );
        let insight = heuristic.analyze_network(devices);
        println!();
        println!("=== Network insight ===");
        println!("Average heuristic score: {:.1}", insight.average_security_score);
        for (device_type, count) in &insight.device_types {
            println!("  {device_type}: {count}");
        }
        if !insight.critical_devices.is_empty() {
            println!("Critical devices:");
            for dev in &insight.critical_devices {
                println!(
                    "  {} ({}): score {}, {}",
                    dev.address, dev.hostname, dev.score, dev.device_type
                );
            }
        }
    }
}
