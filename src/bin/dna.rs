//! DNA CLI - планирование и генерация DNA-модулей.
//!
//! # Использование
//!
//! ```bash
//! # Список модулей каталога
//! dna list --catalog dna.toml
//!
//! # План установки для фреймворка
//! dna plan --catalog dna.toml --framework nextjs business_intelligence
//!
//! # Сгенерировать файлы
//! dna generate --catalog dna.toml --framework tauri --project shop --out ./shop auth-jwt
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dna_modules::catalog::CATALOG_FILE;
use dna_modules::{
    plan, Catalog, Framework, InstallationRequest, Installer, ModuleRegistry, Plan, Problem,
    Rejection, SupportLevel,
};

/// Тип результата команды.
type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// DNA module planner
#[derive(Parser)]
#[command(name = "dna")]
#[command(version)]
#[command(about = "Plan and generate DNA modules for app frameworks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Module catalog (.toml or .json)
    #[arg(short, long, global = true, default_value = CATALOG_FILE)]
    catalog: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered modules
    List {
        /// Only modules of this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Compute an installation plan
    Plan {
        /// Target framework (nextjs, flutter, react-native, tauri, sveltekit, electron)
        #[arg(short, long)]
        framework: Framework,

        /// Module ids
        #[arg(required = true)]
        modules: Vec<String>,
    },

    /// Plan and write generated files
    Generate {
        /// Target framework
        #[arg(short, long)]
        framework: Framework,

        /// Project name
        #[arg(short, long)]
        project: String,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Module ids
        #[arg(required = true)]
        modules: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = load_registry(&cli.catalog).and_then(|registry| match &cli.command {
        Commands::List { category } => list_modules(&registry, category.as_deref()),
        Commands::Plan { framework, modules } => {
            plan_modules(&registry, *framework, modules, cli.quiet)
        }
        Commands::Generate {
            framework,
            project,
            out,
            modules,
        } => generate(&registry, *framework, project, out, modules, cli.quiet),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_registry(path: &Path) -> Result<ModuleRegistry, Box<dyn std::error::Error>> {
    Ok(Catalog::load(path)?.into_registry()?)
}

/// Показать модули каталога.
fn list_modules(registry: &ModuleRegistry, category: Option<&str>) -> CommandResult {
    for (group, modules) in registry.by_category() {
        if category.is_some_and(|c| c != group) {
            continue;
        }

        let title = if group.is_empty() { "(uncategorized)" } else { group };
        println!("\n{}:", title.underline());

        for module in modules {
            let support: Vec<String> = Framework::ALL
                .iter()
                .map(|fw| match module.support_for(*fw) {
                    SupportLevel::Full => fw.as_str().green().to_string(),
                    SupportLevel::Partial => fw.as_str().yellow().to_string(),
                    SupportLevel::Unsupported => fw.as_str().dimmed().to_string(),
                })
                .collect();
            println!(
                "  {} {}  {}",
                module.id.bold(),
                module.version.dimmed(),
                support.join(" ")
            );
        }
    }

    Ok(())
}

/// Построить и показать план.
fn plan_modules(
    registry: &ModuleRegistry,
    framework: Framework,
    modules: &[String],
    quiet: bool,
) -> CommandResult {
    let request = InstallationRequest::new(modules.iter().cloned(), framework);

    match plan(&request, registry) {
        Ok(plan) => {
            if !quiet {
                print_plan(&plan);
            }
            Ok(())
        }
        Err(rejection) => {
            if !quiet {
                print_rejection(&rejection);
            }
            Err(rejection.into())
        }
    }
}

/// Построить план и сгенерировать файлы.
fn generate(
    registry: &ModuleRegistry,
    framework: Framework,
    project: &str,
    out: &Path,
    modules: &[String],
    quiet: bool,
) -> CommandResult {
    let request = InstallationRequest::new(modules.iter().cloned(), framework);
    let plan = plan(&request, registry).inspect_err(|rejection| {
        if !quiet {
            print_rejection(rejection);
        }
    })?;

    let report = Installer::new(registry, project).install(&plan, out)?;

    if !quiet {
        print_plan(&plan);
        println!(
            "{} Wrote {} file(s) to {}",
            "✓".green(),
            report.files.len(),
            out.display()
        );
        for file in &report.files {
            println!("  {}", file.display().to_string().dimmed());
        }
    }

    Ok(())
}

fn print_plan(plan: &Plan) {
    println!(
        "{} Plan for {} ({} modules):",
        "✓".green(),
        plan.framework().to_string().bold(),
        plan.len()
    );
    for (i, id) in plan.modules().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, id);
    }
    for warning in plan.warnings() {
        print_problem(warning);
    }
}

fn print_rejection(rejection: &Rejection) {
    println!(
        "{} {} problem(s) found:",
        "✗".red(),
        rejection.problems().len()
    );
    for problem in rejection.problems().iter().chain(rejection.warnings()) {
        print_problem(problem);
    }
}

fn print_problem(problem: &Problem) {
    let label = if problem.is_fatal() {
        format!("[{}]", problem.code()).red()
    } else {
        format!("[{}]", problem.code()).yellow()
    };
    println!("  {} {}", label, problem);
    if let Some(resolution) = problem.resolution() {
        println!("      {} {}", "hint:".dimmed(), resolution);
    }
}
