use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // 上游成功/失败与时延统计（毫秒）
    upstream_ok: u64,
    upstream_err: u64,
    upstream_latency_sum_ms: u128,
}

fn state() -> &'static Mutex<MetricsState> {
    METRICS.get_or_init(|| {
        Mutex::new(MetricsState {
            total: 0,
            errors: 0,
            per_endpoint: HashMap::new(),
            per_endpoint_err: HashMap::new(),
            upstream_ok: 0,
            upstream_err: 0,
            upstream_latency_sum_ms: 0,
        })
    })
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    };
    s.total += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.total += 1;
    s.errors += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

pub fn observe_upstream(ok: bool, latency_ms: u128) {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if ok {
        s.upstream_ok += 1;
    } else {
        s.upstream_err += 1;
    }
    s.upstream_latency_sum_ms += latency_ms;
}

/// 文本快照（排障用，非Prometheus格式）
pub fn render() -> String {
    let s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let mut out = String::new();
    out.push_str(&format!("requests_total {}\n", s.total));
    out.push_str(&format!("requests_errors {}\n", s.errors));
    out.push_str(&format!("upstream_ok {}\n", s.upstream_ok));
    out.push_str(&format!("upstream_err {}\n", s.upstream_err));
    out.push_str(&format!(
        "upstream_latency_sum_ms {}\n",
        s.upstream_latency_sum_ms
    ));
    let mut endpoints: Vec<_> = s.per_endpoint.iter().collect();
    endpoints.sort();
    for (endpoint, count) in endpoints {
        out.push_str(&format!("endpoint_ok{{{}}} {}\n", endpoint, count));
    }
    let mut endpoint_errs: Vec<_> = s.per_endpoint_err.iter().collect();
    endpoint_errs.sort();
    for (endpoint, count) in endpoint_errs {
        out.push_str(&format!("endpoint_err{{{}}} {}\n", endpoint, count));
    }
    out
}
