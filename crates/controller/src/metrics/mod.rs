pub mod controller_metrics;
pub mod exposition;

pub use controller_metrics::ControllerMetrics;

#[cfg(test)]
mod tests {
    use super::exposition::render_prometheus;
    use super::ControllerMetrics;
    use std::time::Instant;

    #[test]
    fn counters_increment() {
        let m = ControllerMetrics::new();
        m.inc_definitions_created();
        m.inc_definitions_created();
        m.inc_definition_errors();
        assert_eq!(m.definitions_created_val(), 2);
        assert_eq!(m.definition_errors_val(), 1);
    }

    #[test]
    fn gauge_overwrites() {
        let m = ControllerMetrics::new();
        m.set_cached_definitions(7);
        m.set_cached_definitions(3);
        assert_eq!(m.cached_definitions_val(), 3);
    }

    #[test]
    fn latency_recording() {
        let m = ControllerMetrics::new();
        let start = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        m.record_iteration_latency(start);
        let (sum, count) = m.iteration_latency_vals();
        assert!(sum > 0);
        assert_eq!(count, 1);
    }

    #[test]
    fn prometheus_output_contains_metric_names() {
        let m = ControllerMetrics::new();
        m.inc_iterations();
        m.inc_definition_errors();
        m.set_cached_definitions(4);
        let output = render_prometheus(&m);
        assert!(output.contains("alarm_definition_controller_iterations_total 1"));
        assert!(output.contains("alarm_definition_controller_definition_errors_total 1"));
        assert!(output.contains("# TYPE alarm_definition_controller_cached_definitions gauge"));
        assert!(output.contains("alarm_definition_controller_cached_definitions 4"));
        assert!(output.contains("# TYPE alarm_definition_controller_iteration_latency_us summary"));
    }
}
