//! Pipeline options.

/// Knobs for one repair invocation. `Default` gives the behavior the CLI
/// ships with.
#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Changes scoring below this are downgraded to warnings in the final
    /// pass. Clamped to `[0, 1]`.
    pub confidence_threshold: f64,

    /// Lowers the effective confidence threshold and enables structural
    /// fixes that are skipped otherwise.
    pub aggressive: bool,

    /// Upper bound on error-driven repair rounds in the validation
    /// iteration pass.
    pub max_iterations: usize,

    /// Spaces per indentation level for inserted structure.
    pub indent_size: usize,

    /// When `false`, the pipeline runs for its diagnostics but the report
    /// carries the original input as `content`.
    pub auto_fix: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            aggressive: false,
            max_iterations: 3,
            indent_size: 2,
            auto_fix: true,
        }
    }
}

impl FixOptions {
    /// The threshold actually applied, accounting for aggressive mode.
    pub fn effective_threshold(&self) -> f64 {
        let t = self.confidence_threshold.clamp(0.0, 1.0);
        if self.aggressive { (t - 0.2).max(0.0) } else { t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = FixOptions::default();
        assert!((opts.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert!(!opts.aggressive);
        assert_eq!(opts.max_iterations, 3);
        assert_eq!(opts.indent_size, 2);
        assert!(opts.auto_fix);
    }

    #[test]
    fn aggressive_lowers_threshold() {
        let opts = FixOptions {
            aggressive: true,
            ..FixOptions::default()
        };
        assert!((opts.effective_threshold() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_clamped() {
        let opts = FixOptions {
            confidence_threshold: 3.0,
            ..FixOptions::default()
        };
        assert!((opts.effective_threshold() - 1.0).abs() < f64::EPSILON);
    }
}
