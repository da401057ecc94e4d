use console::Style;
use focuslock_core::config::FocusLockConfig;
use focuslock_core::{FocusOffset, OffsetEstimator, RefineStatus, Refinement, SpotFit};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    good: Style,
    bad: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            good: Style::new().green(),
            bad: Style::new().dim().yellow(),
        }
    }

    fn status(&self, status: RefineStatus) -> String {
        let text = status_name(status);
        match status {
            RefineStatus::Converged => self.good.apply_to(text).to_string(),
            _ => self.bad.apply_to(text).to_string(),
        }
    }
}

pub fn status_name(status: RefineStatus) -> &'static str {
    match status {
        RefineStatus::Converged => "converged",
        RefineStatus::MaxIterationsExceeded => "max iterations",
        RefineStatus::NotSolvable => "not solvable",
    }
}

fn format_offset(offset: FocusOffset) -> String {
    format!("dy {:+.4}  dx {:+.4}", offset.dy, offset.dx)
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

/// Print the outcome of one estimator run.
pub fn print_offset_report(estimator: &OffsetEstimator, refinement: &Refinement) {
    let s = Styles::new();
    let (grid_h, grid_w) = estimator.grid_dim();

    print_title(&s, "Focus Lock Offset");

    println!("  {}", s.header.apply_to("Grid"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frame"),
        s.value.apply_to(format!("{}x{}", estimator.shape().height, estimator.shape().width))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Downsample"),
        s.value.apply_to(estimator.downsample())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Padded"),
        s.value.apply_to(format!("{grid_h}x{grid_w}"))
    );
    println!();

    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Coarse"),
        s.value.apply_to(format_offset(estimator.coarse_offset()))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Refined"),
        s.value.apply_to(format_offset(refinement.offset))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Pixels"),
        s.value.apply_to(format_offset(refinement.pixel_offset(estimator.downsample())))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Magnitude"),
        s.value.apply_to(format!("{:.6}", estimator.magnitude()))
    );
    println!(
        "    {:<12}{} after {} iterations",
        s.label.apply_to("Status"),
        s.status(refinement.status),
        refinement.iterations
    );
    println!();
}

/// Print the outcome of a Gaussian spot search.
pub fn print_spot_report(sigma: f64, center: (f64, f64), start: (f64, f64), fit: &SpotFit) {
    let s = Styles::new();

    print_title(&s, "Gaussian Spot Fit");

    println!(
        "    {:<12}{}",
        s.label.apply_to("Sigma"),
        s.value.apply_to(sigma)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Start"),
        s.value.apply_to(format!("x {:+.4}  y {:+.4}", start.0, start.1))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Displaced"),
        s.value.apply_to(format!("x {:+.4}  y {:+.4}", fit.x, fit.y))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Pixel"),
        s.value.apply_to(format!("x {:.4}  y {:.4}", center.0 + fit.x, center.1 + fit.y))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Value"),
        s.value.apply_to(format!("{:.6}", fit.value))
    );
    let status = if fit.converged {
        s.good.apply_to("converged")
    } else {
        s.bad.apply_to("not converged")
    };
    println!(
        "    {:<12}{} after {} iterations",
        s.label.apply_to("Status"),
        status,
        fit.iterations
    );
    println!();
}

/// Print the effective settings.
pub fn print_config_summary(config: &FocusLockConfig) {
    let s = Styles::new();

    print_title(&s, "Focus Lock Settings");

    println!("  {}", s.header.apply_to("Estimator"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Downsample"),
        s.value.apply_to(config.estimator.downsample)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Background"),
        s.value.apply_to(config.estimator.background)
    );
    println!();

    println!("  {}", s.header.apply_to("Refinement"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tolerance"),
        s.value.apply_to(config.refine.step_tolerance)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max Iter"),
        s.value.apply_to(config.refine.max_iterations)
    );
    println!();

    println!("  {}", s.header.apply_to("Spot Fit"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Sigma"),
        s.value.apply_to(config.spot_fit.sigma)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tolerance"),
        s.value.apply_to(config.spot_fit.tolerance)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max Iter"),
        s.value.apply_to(config.spot_fit.max_iterations)
    );
    println!();
}
