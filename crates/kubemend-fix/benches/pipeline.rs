use core::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use kubemend_fix::{FixOptions, fix};

const BROKEN: &str = include_str!("../testdata/broken_deployment.yaml");
const CLEAN: &str = concat!(
    "apiVersion: apps/v1\n",
    "kind: Deployment\n",
    "metadata:\n",
    "  name: web\n",
    "  namespace: default\n",
    "spec:\n",
    "  replicas: 2\n",
    "  selector:\n",
    "    matchLabels:\n",
    "      app: web\n",
    "  template:\n",
    "    metadata:\n",
    "      labels:\n",
    "        app: web\n",
    "    spec:\n",
    "      containers:\n",
    "      - name: web\n",
    "        image: nginx:1.25\n",
);

fn bench_pipeline(c: &mut Criterion) {
    let opts = FixOptions::default();
    c.bench_function("fix_broken_deployment", |b| {
        b.iter(|| fix(black_box(BROKEN), &opts));
    });
    c.bench_function("fix_clean_manifest", |b| {
        b.iter(|| fix(black_box(CLEAN), &opts));
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
