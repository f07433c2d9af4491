use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use holdings_graph_core::{
    approximate_betweenness, capitalization, closeness_centrality_with, clustering_coefficient,
    degree_centrality, for_each_subgraph, longest_shortest_path, sample_connected, top_k,
    AnalysisConfig, EsuOptions, Graph, GraphError, NodeId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run all generators and benchmark each
    All,
    /// Funds holding stocks and other funds (bipartite-ish, heavy-tailed values)
    Holdings,
    /// Preferential attachment via edge sampling (hub-and-spoke)
    Scalefree,
    /// Watts-Strogatz ring lattice + shortcuts
    Smallworld,
    /// Erdos-Renyi uniform random edges
    Random,
    /// Two dense clusters connected by a thin bridge
    Barbell,
}

#[derive(Debug, Parser)]
#[command(
    name = "holdings-graph-bench",
    about = "Benchmark holdings-graph-core analyses on synthetic graphs"
)]
struct Args {
    #[arg(value_enum, default_value = "all")]
    mode: Mode,

    /// Nodes per generated graph
    #[arg(default_value_t = 20_000)]
    node_count: usize,

    /// Size of the connected sample that ESU and closeness run on
    #[arg(long, default_value_t = 200, env = "HOLDINGS_GRAPH_SAMPLE_SIZE")]
    sample_size: usize,

    /// Subgraph size for enumeration
    #[arg(short, long, default_value_t = 3, env = "HOLDINGS_GRAPH_K")]
    k: usize,

    /// Seed for sampling and pivot selection (random when unset)
    #[arg(long, env = "HOLDINGS_GRAPH_SEED")]
    seed: Option<u64>,

    /// Memory cap for the dense distance matrix
    #[arg(long, default_value_t = holdings_graph_core::DEFAULT_MAX_MATRIX_MEMORY_MB, env = "HOLDINGS_GRAPH_MAX_MATRIX_MEMORY_MB")]
    max_matrix_memory_mb: u32,

    /// Wall-clock budget for enumeration, in seconds (0 = unbounded)
    #[arg(long, default_value_t = 30, env = "HOLDINGS_GRAPH_ESU_DEADLINE_SECS")]
    esu_deadline_secs: u64,

    /// Share of nodes used as betweenness pivots
    #[arg(long, default_value_t = holdings_graph_core::DEFAULT_BETWEENNESS_PERCENTAGE, env = "HOLDINGS_GRAPH_BETWEENNESS_PERCENTAGE")]
    betweenness_percentage: f64,

    /// Print one JSON report per generator instead of tables
    #[arg(long)]
    json: bool,
}

impl Args {
    fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            max_matrix_memory_mb: self.max_matrix_memory_mb,
            esu_deadline: (self.esu_deadline_secs > 0)
                .then(|| Duration::from_secs(self.esu_deadline_secs)),
            sample_seed: self.seed,
            betweenness_percentage: self.betweenness_percentage,
        }
    }
}

#[derive(Debug, Serialize)]
struct Ranked {
    label: String,
    score: f64,
}

#[derive(Debug, Default, Serialize)]
struct BenchReport {
    generator: String,
    nodes: usize,
    edges: usize,
    memory_bytes: usize,
    generate_ms: f64,
    top_degree: Vec<Ranked>,
    top_capitalization: Vec<Ranked>,
    top_betweenness: Vec<Ranked>,
    betweenness_ms: f64,
    diameter_hops: Option<usize>,
    sample_nodes: usize,
    sample_edges: usize,
    sample_underfilled: bool,
    esu_k: usize,
    esu_subgraphs: Option<usize>,
    esu_ms: f64,
    esu_timed_out: bool,
    top_closeness: Vec<Ranked>,
    closeness_ms: f64,
    top_clustering: Vec<Ranked>,
    clustering_ms: f64,
}

type Generator = fn(usize) -> Result<Graph>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.analysis_config();
    config.validate().context("invalid analysis settings")?;

    let generators: Vec<(&str, Generator)> = match args.mode {
        Mode::Holdings => vec![("Fund holdings", gen_holdings)],
        Mode::Scalefree => vec![("Scale-free (edge sampling)", gen_scale_free)],
        Mode::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        Mode::Random => vec![("Erdos-Renyi random", gen_random)],
        Mode::Barbell => vec![("Barbell (cluster-bridge-cluster)", gen_barbell)],
        Mode::All => vec![
            ("Fund holdings", gen_holdings as Generator),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (cluster-bridge-cluster)", gen_barbell),
        ],
    };

    info!(mode = ?args.mode, node_count = args.node_count, k = args.k, "starting benchmark");

    for (name, generator) in generators {
        let report = run_benchmark(name, generator, &args, &config)
            .with_context(|| format!("benchmark '{name}' failed"))?;
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_report(&report);
        }
    }

    Ok(())
}

fn ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

fn ranked(graph: &Graph, ids: &[NodeId], score: impl Fn(NodeId) -> f64) -> Vec<Ranked> {
    ids.iter()
        .map(|&id| Ranked {
            label: graph.label(id).unwrap_or("?").to_string(),
            score: score(id),
        })
        .collect()
}

fn run_benchmark(
    name: &str,
    generator: Generator,
    args: &Args,
    config: &AnalysisConfig,
) -> Result<BenchReport> {
    let mut rng = match config.sample_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let t = Instant::now();
    let graph = generator(args.node_count)?;
    let mut report = BenchReport {
        generator: name.to_string(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        memory_bytes: graph.memory_usage(),
        generate_ms: ms(t),
        esu_k: args.k,
        ..BenchReport::default()
    };
    info!(generator = name, nodes = report.nodes, edges = report.edges, "graph generated");

    report.top_degree = degree_centrality(&graph, 5)
        .into_iter()
        .map(|d| Ranked {
            label: d.label,
            score: f64::from(d.total_degree),
        })
        .collect();

    let cap = capitalization(&graph);
    report.top_capitalization = ranked(&graph, &top_k(&cap, 5), |id| cap[&id]);

    let t = Instant::now();
    let betweenness = approximate_betweenness(&graph, config.betweenness_percentage, true, &mut rng)?;
    report.betweenness_ms = ms(t);
    report.top_betweenness = ranked(&graph, &top_k(&betweenness, 5), |id| betweenness[&id]);

    // A sample must leave at least one node of the graph out
    let sample_size = args.sample_size.min(graph.node_count().saturating_sub(1));
    if sample_size == 0 {
        warn!(generator = name, nodes = report.nodes, "graph too small to sample");
        return Ok(report);
    }
    if sample_size < args.sample_size {
        info!(
            generator = name,
            requested = args.sample_size,
            sample_size,
            "sample size clamped to graph"
        );
    }
    let sample = match sample_connected(&graph, sample_size, &mut rng) {
        Ok(sample) => sample,
        Err(err @ GraphError::InsufficientComponentSize { .. }) => {
            warn!(generator = name, %err, "skipping sample-based analyses");
            return Ok(report);
        }
        Err(err) => return Err(err.into()),
    };
    if sample.is_underfilled() {
        warn!(
            requested = sample.requested,
            selected = sample.len(),
            "sample smaller than requested"
        );
    }
    let sub = &sample.subgraph;
    report.sample_nodes = sub.node_count();
    report.sample_edges = sub.edge_count();
    report.sample_underfilled = sample.is_underfilled();
    report.diameter_hops = longest_shortest_path(sub).map(|p| p.len().saturating_sub(1));

    if args.k <= sub.node_count() {
        let t = Instant::now();
        let options = EsuOptions::from_config(config);
        match for_each_subgraph(sub, args.k, &options, |_| std::ops::ControlFlow::Continue(())) {
            Ok(count) => report.esu_subgraphs = Some(count),
            Err(GraphError::DeadlineExceeded { emitted }) => {
                warn!(emitted, "enumeration hit its deadline");
                report.esu_timed_out = true;
                report.esu_subgraphs = Some(emitted);
            }
            Err(err) => return Err(err.into()),
        }
        report.esu_ms = ms(t);
    }

    let t = Instant::now();
    let closeness = closeness_centrality_with(sub, config)?;
    report.closeness_ms = ms(t);
    report.top_closeness = ranked(sub, &top_k(&closeness, 5), |id| closeness[&id]);

    let t = Instant::now();
    let clustering = clustering_coefficient(sub);
    report.clustering_ms = ms(t);
    report.top_clustering = ranked(sub, &top_k(&clustering, 5), |id| clustering[&id]);

    Ok(report)
}

fn print_ranked(title: &str, rows: &[Ranked]) {
    println!("{title}:");
    for r in rows {
        println!("  {:<16} {:>14.4}", r.label, r.score);
    }
}

fn print_report(r: &BenchReport) {
    println!("--- {} ---", r.generator);
    println!(
        "Generated in {:.2}ms — {} nodes, {} edges, ~{:.1}MB",
        r.generate_ms,
        r.nodes,
        r.edges,
        r.memory_bytes as f64 / 1_048_576.0
    );
    println!();
    print_ranked("Top degree", &r.top_degree);
    print_ranked("Top capitalization", &r.top_capitalization);
    print_ranked(
        &format!("Top betweenness ({:.1}ms)", r.betweenness_ms),
        &r.top_betweenness,
    );
    println!();

    if r.sample_nodes == 0 {
        println!("No component large enough to sample");
        println!();
        return;
    }
    println!(
        "Sample: {} nodes, {} edges{}",
        r.sample_nodes,
        r.sample_edges,
        if r.sample_underfilled { " (underfilled)" } else { "" }
    );
    if let Some(hops) = r.diameter_hops {
        println!("Longest shortest path in sample: {hops} hops");
    }
    match r.esu_subgraphs {
        Some(count) => println!(
            "Connected {}-subgraphs: {}{} in {:.1}ms",
            r.esu_k,
            count,
            if r.esu_timed_out { "+ (deadline)" } else { "" },
            r.esu_ms
        ),
        None => println!("k={} exceeds sample size, enumeration skipped", r.esu_k),
    }
    print_ranked(
        &format!("Top closeness ({:.1}ms)", r.closeness_ms),
        &r.top_closeness,
    );
    print_ranked(
        &format!("Top clustering ({:.1}ms)", r.clustering_ms),
        &r.top_clustering,
    );
    println!();
}

// ---------------------------------------------------------------------------
// Generators — all O(n) or O(n + edges), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_index(&mut self, max: usize) -> usize {
        self.next(max as u64) as usize
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
    /// Heavy-tailed position size, at least 1.0.
    fn market_value(&mut self) -> f64 {
        let u = self.next_f64().max(1e-9);
        (1.0 / u).powf(1.2).min(1e9)
    }
}

fn with_nodes(prefix: &str, node_count: usize, edges_per_node: usize) -> Graph {
    let mut graph = Graph::with_capacity(node_count, node_count * edges_per_node);
    for i in 0..node_count {
        graph.add_node(format!("{prefix}{i}"));
    }
    graph
}

/// Funds holding stocks, with ~5% of holdings being other funds.
///
/// Stock popularity is heavy-tailed: each position picks a previously held
/// stock with 70% probability, so a few names end up in most portfolios.
fn gen_holdings(node_count: usize) -> Result<Graph> {
    let funds = (node_count / 10).max(2);
    let stocks = node_count.saturating_sub(funds).max(1);
    let mut graph = Graph::with_capacity(node_count, funds * 40);
    let mut rng = FastRng::new(20240101);

    for i in 0..funds {
        graph.add_node(format!("FUND{i}"));
    }
    for i in 0..stocks {
        graph.add_node(format!("STK{i}"));
    }

    let mut held: Vec<NodeId> = Vec::with_capacity(funds * 40);
    for fund in 0..funds {
        let positions = 10 + rng.next_index(50);
        for _ in 0..positions {
            let target = if rng.next(20) == 0 {
                rng.next_index(funds)
            } else if !held.is_empty() && rng.next(10) < 7 {
                held[rng.next_index(held.len())]
            } else {
                funds + rng.next_index(stocks)
            };
            if target != fund {
                graph.add_edge(fund, target, rng.market_value())?;
                held.push(target);
            }
        }
    }

    Ok(graph)
}

/// Scale-free via edge-list sampling (O(edges), not O(n²)).
///
/// Preferential attachment by picking a random existing edge and connecting
/// to one of its endpoints. Nodes with more edges are more likely to be picked.
fn gen_scale_free(node_count: usize) -> Result<Graph> {
    let edges_per_node = 5;
    let mut graph = with_nodes("sf", node_count, edges_per_node);
    let mut rng = FastRng::new(12345);

    // Edge list for O(1) preferential attachment sampling
    let mut edge_endpoints: Vec<NodeId> = Vec::with_capacity(node_count * edges_per_node * 2);

    // Seed: small clique
    let seed = 5.min(node_count);
    for i in 0..seed {
        for j in (i + 1)..seed {
            graph.add_edge(i, j, rng.market_value())?;
            edge_endpoints.push(i);
            edge_endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        let attach = edges_per_node.min(new_node);
        for _ in 0..attach {
            if edge_endpoints.is_empty() {
                break;
            }
            let target = edge_endpoints[rng.next_index(edge_endpoints.len())];
            if target != new_node {
                graph.add_edge(new_node, target, rng.market_value())?;
                edge_endpoints.push(new_node);
                edge_endpoints.push(target);
            }
        }
    }

    Ok(graph)
}

/// Small-world (Watts-Strogatz): ring lattice + random rewiring.
fn gen_small_world(node_count: usize) -> Result<Graph> {
    let k = 4; // neighbors on each side
    let p = 0.05f64; // rewire probability
    let mut graph = with_nodes("sw", node_count, k);
    let mut rng = FastRng::new(67890);

    // Forward direction only to avoid double-edges
    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            let target = if rng.next_f64() < p {
                rng.next_index(node_count)
            } else {
                neighbor
            };
            if target != i {
                graph.add_edge(i, target, 1.0 + rng.next_f64() * 9.0)?;
            }
        }
    }

    Ok(graph)
}

/// Erdos-Renyi: ~3 random edges per node. Baseline topology with no structure.
fn gen_random(node_count: usize) -> Result<Graph> {
    let target_edges = node_count * 3;
    let mut graph = with_nodes("er", node_count, 3);
    let mut rng = FastRng::new(54321);

    for _ in 0..target_edges {
        let from = rng.next_index(node_count);
        let to = rng.next_index(node_count);
        if from != to {
            graph.add_edge(from, to, rng.market_value())?;
        }
    }

    Ok(graph)
}

/// Barbell: two dense clusters connected by a single thin bridge.
///
/// Worst case for sampling near a bottleneck. Each cluster has ~n/2 nodes
/// with ~8 random internal edges each; they're joined by a 10-node chain.
fn gen_barbell(node_count: usize) -> Result<Graph> {
    let bridge_len = 10usize.min(node_count);
    let cluster = (node_count - bridge_len) / 2;
    let mut graph = Graph::with_capacity(node_count, cluster * 16 + bridge_len);
    let mut rng = FastRng::new(99999);

    for i in 0..cluster {
        graph.add_node(format!("A{i}"));
    }
    for i in 0..bridge_len {
        graph.add_node(format!("bridge{i}"));
    }
    for i in 0..cluster {
        graph.add_node(format!("B{i}"));
    }

    let b_start = cluster + bridge_len;
    for offset in [0, b_start] {
        for i in 0..cluster {
            for _ in 0..8usize.min(cluster.saturating_sub(1)) {
                let target = rng.next_index(cluster);
                if target != i {
                    graph.add_edge(offset + i, offset + target, rng.market_value())?;
                }
            }
        }
    }

    // Bridge: chain from last node of A through the bridge to first node of B
    let mut prev = cluster.checked_sub(1);
    for id in cluster..b_start {
        if let Some(p) = prev {
            graph.add_edge(p, id, 1.0)?;
        }
        prev = Some(id);
    }
    if let Some(p) = prev {
        if cluster > 0 {
            graph.add_edge(p, b_start, 1.0)?;
        }
    }

    Ok(graph)
}
