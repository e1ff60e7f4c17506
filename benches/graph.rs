//! Benchmarks for n3graph store and matching operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use n3graph::{Graph, Node, Triple};

/// A chain of `len` blank nodes, each with a literal label
fn chain(len: usize, prefix: &str) -> Graph {
    let mut graph = Graph::new();
    let next = Node::uri("http://example.org/next");
    let label = Node::uri("http://example.org/label");
    let nodes: Vec<Node> = (0..len)
        .map(|i| graph.create_blank_node_with_id(&format!("{}{}", prefix, i)))
        .collect();
    for (i, node) in nodes.iter().enumerate() {
        let literal = Node::literal(format!("node {}", i));
        graph.assert(Triple::new(node.clone(), label.clone(), literal).unwrap());
        if let Some(successor) = nodes.get(i + 1) {
            graph.assert(Triple::new(node.clone(), next.clone(), successor.clone()).unwrap());
        }
    }
    graph
}

fn ground(len: usize) -> Graph {
    let mut graph = Graph::new();
    for i in 0..len {
        graph.assert(
            Triple::new(
                Node::uri(format!("http://example.org/s{}", i % 50)),
                Node::uri(format!("http://example.org/p{}", i % 7)),
                Node::literal(format!("{}", i)),
            )
            .unwrap(),
        );
    }
    graph
}

fn find_benchmark(c: &mut Criterion) {
    let graph = ground(5_000);
    let subject = Node::uri("http://example.org/s3");
    let predicate = Node::uri("http://example.org/p2");

    let mut group = c.benchmark_group("find");
    group.bench_function("subject", |b| {
        b.iter(|| black_box(graph.find(Some(&subject), None, None).count()))
    });
    group.bench_function("subject_predicate", |b| {
        b.iter(|| black_box(graph.find(Some(&subject), Some(&predicate), None).count()))
    });
    group.bench_function("all", |b| b.iter(|| black_box(graph.find(None, None, None).count())));
    group.finish();
}

fn equality_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("equals");
    for len in [10, 100, 500] {
        let a = chain(len, "a");
        let b = chain(len, "z");
        group.bench_with_input(BenchmarkId::new("blank_chain", len), &(a, b), |bench, (a, b)| {
            bench.iter(|| black_box(a.equals(b)))
        });
    }
    group.finish();
}

fn diff_benchmark(c: &mut Criterion) {
    let a = ground(1_000);
    let mut b = ground(1_000);
    b.assert(
        Triple::new(
            Node::uri("http://example.org/extra"),
            Node::uri("http://example.org/p0"),
            Node::literal("x"),
        )
        .unwrap(),
    );
    c.bench_function("difference_ground", |bench| bench.iter(|| black_box(a.difference(&b))));
}

criterion_group!(benches, find_benchmark, equality_benchmark, diff_benchmark);
criterion_main!(benches);
