use std::fmt::Write;
use std::sync::Arc;

use super::controller_metrics::ControllerMetrics;

const PREFIX: &str = "alarm_definition_controller";

pub fn render_prometheus(m: &Arc<ControllerMetrics>) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "iterations_total", m.iterations_val());
    write_counter(&mut out, "iterations_skipped_total", m.iterations_skipped_val());
    write_counter(&mut out, "definitions_created_total", m.definitions_created_val());
    write_counter(&mut out, "definitions_updated_total", m.definitions_updated_val());
    write_counter(&mut out, "definitions_deleted_total", m.definitions_deleted_val());
    write_counter(&mut out, "definition_errors_total", m.definition_errors_val());
    write_counter(&mut out, "cache_refreshes_total", m.cache_refreshes_val());
    write_gauge(&mut out, "cached_definitions", m.cached_definitions_val());

    let (sum, count) = m.iteration_latency_vals();
    write_summary(&mut out, "iteration_latency_us", sum, count);

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    let _ = writeln!(out, "# TYPE {PREFIX}_{name} counter");
    let _ = writeln!(out, "{PREFIX}_{name} {val}");
}

fn write_gauge(out: &mut String, name: &str, val: u64) {
    let _ = writeln!(out, "# TYPE {PREFIX}_{name} gauge");
    let _ = writeln!(out, "{PREFIX}_{name} {val}");
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    let _ = writeln!(out, "# TYPE {PREFIX}_{name} summary");
    let _ = writeln!(out, "{PREFIX}_{name}_sum {sum}");
    let _ = writeln!(out, "{PREFIX}_{name}_count {count}");
}
