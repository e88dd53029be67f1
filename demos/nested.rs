use scopetrace::{render, trace_point, trace_scope, INFO};
use tracing_subscriber::{fmt, util::SubscriberInitExt, EnvFilter};

fn repeated(repetition: i32) {
    let _scope = trace_scope!(INFO);
    trace_point!(_scope, "repetition");
    let _ = repetition;
}

fn random() {
    let _scope = trace_scope!(INFO);
    trace_point!(_scope, "random");
}

fn nested() {
    let _scope = trace_scope!(INFO);
    random();
    for i in 1..=1000 {
        repeated(i);
    }
    trace_point!(_scope, "nested");
}

fn nested2() {
    let _scope = trace_scope!(INFO);
    random();
    for i in 1..=1000 {
        repeated(i);
    }
    nested();
    trace_point!(_scope, "nested2");
}

fn nest_deeply(nest: usize) {
    let _scope = trace_scope!(INFO);
    if nest == 0 {
        trace_point!(_scope, "base");
        return;
    }
    nest_deeply(nest - 1);
    trace_point!(_scope, "nest_deeply");
}

fn request() {
    let _scope = trace_scope!(INFO);
    nested();
    repeated(-1);
    repeated(-2);
    nest_deeply(100);
    nested2();
    trace_point!(_scope, "request");
}

fn main() {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info")).unwrap();
    fmt::fmt().with_env_filter(filter).with_target(false).finish().init();

    request();

    let report = scopetrace::record_table();
    println!("{}", render::render_parallel_table(&report));
}
