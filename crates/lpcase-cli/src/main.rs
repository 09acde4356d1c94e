use clap::{Parser, Subcommand, ValueEnum};
use lpcase_lang::{Model, ModelSolution};
use lpcase_solver::{PivotRule, SolutionStatus, Solver};
use lpcase_suite::{Expectations, Io, RunOptions, Summary};
use std::fmt::Display;
use std::path::PathBuf;

mod logging;

#[derive(Parser)]
#[command(name = "lpcase")]
#[command(about = "LP test problems, a simplex solver, and the harness that checks it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pivot limit across both simplex phases
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Numerical tolerance of the simplex solver (finite, non-negative)
    #[arg(long, global = true, value_parser = parse_tolerance)]
    tolerance: Option<f64>,

    /// Use Bland's rule instead of the largest reduced cost (solve, solve-file)
    #[arg(long, global = true)]
    bland: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the test problems and solver cases
    List,
    /// Print a test problem's model
    Show {
        problem: String,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Write a test problem as CPLEX LP text
    Write {
        problem: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Solve a test problem
    Solve {
        problem: String,
        /// How the model reaches the solver (direct, lp)
        #[arg(long, default_value = "direct")]
        io: Io,
        /// Also print duals and reduced costs
        #[arg(short, long)]
        suffixes: bool,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Parse and solve a CPLEX LP file
    SolveFile {
        file: PathBuf,
        /// Also print duals and reduced costs
        #[arg(short, long)]
        suffixes: bool,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// List every generated scenario with its status
    Scenarios {
        /// Extra expectation tables (TOML)
        #[arg(short, long)]
        expectations: Option<PathBuf>,
    },
    /// Run the scenarios and print the summary table
    Test {
        /// Only run these solvers
        #[arg(long = "solver")]
        solvers: Vec<String>,
        /// List unexpected results before the summary
        #[arg(short, long)]
        verbose: bool,
        /// Extra expectation tables (TOML)
        #[arg(short, long)]
        expectations: Option<PathBuf>,
    },
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let tol: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if tol.is_finite() && tol >= 0.0 {
        Ok(tol)
    } else {
        Err(format!("must be finite and non-negative, got {}", s))
    }
}

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

impl Cli {
    /// Reject option combinations clap cannot express.
    fn check(&self) -> Result<(), String> {
        if self.bland && matches!(self.command, Commands::Test { .. } | Commands::Scenarios { .. }) {
            return Err("--bland applies to solve and solve-file; each solver case fixes its own pivot rule".to_string());
        }
        Ok(())
    }

    fn solver(&self) -> Solver {
        let mut solver = Solver::new();
        if let Some(max) = self.max_iterations {
            solver = solver.with_max_iterations(max);
        }
        if let Some(tol) = self.tolerance {
            solver = solver.with_tolerance(tol);
        }
        if self.bland {
            solver = solver.with_pivot_rule(PivotRule::Bland);
        }
        solver
    }
}

fn load_expectations(path: Option<&PathBuf>) -> Expectations {
    let mut expectations = Expectations::builtin();
    if let Some(path) = path {
        match Expectations::load(path) {
            Ok(extra) => expectations.extend(extra),
            Err(e) => fail("Expectations error", e),
        }
    }
    expectations
}

fn print_solution(model: &Model, solution: &ModelSolution, suffixes: bool, format: Format) {
    if format == Format::Json {
        match serde_json::to_string_pretty(solution) {
            Ok(json) => println!("{}", json),
            Err(e) => fail("Serialization error", e),
        }
        return;
    }

    println!("Model: {}", model.name);
    println!("Status: {}", solution.status);
    println!("Iterations: {}", solution.iterations);
    let Some(objective) = solution.objective else {
        return;
    };
    if let Some(obj) = model.objective() {
        println!("Objective {} ({}): {}", obj.name, obj.sense.name(), objective);
    }
    println!();
    println!("Variables:");
    for var in model.vars() {
        if let Some(value) = solution.value(&var.name) {
            println!("  {:20} {:>12.6}", var.name, value);
        }
    }

    if suffixes {
        println!();
        println!("Duals:");
        for c in model.constraints().iter().filter(|c| c.active) {
            if let Some(dual) = solution.dual(&c.name) {
                println!("  {:20} {:>12.6}", c.name, dual);
            }
        }
        println!();
        println!("Reduced costs:");
        for var in model.vars() {
            if let Some(rc) = solution.reduced_cost(&var.name) {
                println!("  {:20} {:>12.6}", var.name, rc);
            }
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(e) = cli.check() {
        fail("Error", e);
    }
    let solver = cli.solver();

    match &cli.command {
        Commands::List => {
            println!("Problems:");
            for p in lpcase_suite::all_problems() {
                println!("  {:24} {}", p.name, p.description);
            }
            println!();
            println!("Solver cases:");
            for case in lpcase_suite::builtin_solvers() {
                let status = if case.available { "available" } else { "unavailable" };
                println!("  {:24} {} ({})", case.label(), case.version, status);
            }
        }
        Commands::Show { problem, format } => {
            let (_, model) = lpcase_suite::build_problem(problem).unwrap_or_else(|e| fail("Error", e));
            if *format == Format::Json {
                match serde_json::to_string_pretty(&model) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail("Serialization error", e),
                }
            } else {
                print!("{}", model);
            }
        }
        Commands::Write { problem, output } => {
            let (_, model) = lpcase_suite::build_problem(problem).unwrap_or_else(|e| fail("Error", e));
            let text = lpcase_lang::write_lp(&model).unwrap_or_else(|e| fail("Write error", e));
            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, text) {
                        fail("Error writing file", e);
                    }
                }
                None => print!("{}", text),
            }
        }
        Commands::Solve {
            problem,
            io,
            suffixes,
            format,
        } => {
            let (_, model) = lpcase_suite::build_problem(problem).unwrap_or_else(|e| fail("Error", e));
            let mut case =
                lpcase_suite::solver_case(&format!("simplex/{}", io)).unwrap_or_else(|e| fail("Error", e));
            case.pivot_rule = solver.pivot_rule();
            let solution = case.solve(&model, &solver).unwrap_or_else(|e| fail("Solve error", e));
            print_solution(&model, &solution, *suffixes, *format);
            if solution.status != SolutionStatus::Optimal {
                std::process::exit(1);
            }
        }
        Commands::SolveFile {
            file,
            suffixes,
            format,
        } => {
            let source = std::fs::read_to_string(file).unwrap_or_else(|e| fail("Error reading file", e));
            let model = lpcase_lang::Parser::parse(&source).unwrap_or_else(|e| fail("Parse error", e));
            let solution = lpcase_lang::solve(&model, &solver).unwrap_or_else(|e| fail("Solve error", e));
            print_solution(&model, &solution, *suffixes, *format);
            if solution.status != SolutionStatus::Optimal {
                std::process::exit(1);
            }
        }
        Commands::Scenarios { expectations } => {
            let expectations = load_expectations(expectations.as_ref());
            let scenarios =
                lpcase_suite::generate_scenarios(&lpcase_suite::builtin_solvers(), &expectations, |_| true);
            for s in &scenarios {
                println!(
                    "{:24} {:16} {:8} {:18} {}",
                    s.problem.name, s.solver.name, s.solver.io, s.status, s.message
                );
            }
        }
        Commands::Test {
            solvers,
            verbose,
            expectations,
        } => {
            let expectations = load_expectations(expectations.as_ref());
            let scenarios =
                lpcase_suite::generate_scenarios(&lpcase_suite::builtin_solvers(), &expectations, |_| true);
            let options = RunOptions {
                solvers: solvers.clone(),
                solver,
                ..RunOptions::default()
            };
            let results = lpcase_suite::run_scenarios(&scenarios, &options);
            let summary = Summary::from_results(&results);
            if *verbose {
                print!("{}", summary.render_failures());
            }
            print!("{}", summary.render());
            if summary.has_unexpected() {
                std::process::exit(1);
            }
        }
    }
}
