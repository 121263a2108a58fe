use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sentsif::{
    corpus_digest, embed_sentences, fit_components, load_sentences, load_word_vectors,
    write_fit_manifest, ComponentStore, FitManifest, SentenceBatch, SentenceIndexer, SifParams,
    WordVectorTable, WordWeights, DEFAULT_COMPONENT_DIR, DEFAULT_DAMPING, DEFAULT_SIF_PARAM,
};

#[derive(Parser)]
#[command(name = "sentsif", version, about = "SIF sentence embeddings from word vectors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the principal components of a corpus and persist them
    Fit {
        /// GloVe-style word-vector text file
        #[arg(long)]
        vectors: PathBuf,

        /// Word-frequency file ("word count" per line); omit for unweighted averaging
        #[arg(long)]
        frequencies: Option<PathBuf>,

        /// Corpus: a text file with one sentence per line, or a directory of .txt files
        #[arg(long)]
        sentences: PathBuf,

        /// Name for the persisted artifact; the fit suffix is appended
        #[arg(long)]
        tag: String,

        /// Number of principal components to fit (0 disables fitting)
        #[arg(long, default_value_t = 1)]
        rmpc: usize,

        /// Directory holding component artifacts
        #[arg(long, default_value = DEFAULT_COMPONENT_DIR)]
        components_dir: PathBuf,

        /// SIF weighting parameter a in a / (a + p(w))
        #[arg(long, default_value_t = DEFAULT_SIF_PARAM)]
        weight_param: f32,
    },

    /// Embed a corpus, removing previously fitted principal components
    Embed {
        /// GloVe-style word-vector text file
        #[arg(long)]
        vectors: PathBuf,

        /// Word-frequency file ("word count" per line); omit for unweighted averaging
        #[arg(long)]
        frequencies: Option<PathBuf>,

        /// Corpus: a text file with one sentence per line, or a directory of .txt files
        #[arg(long)]
        sentences: PathBuf,

        /// Artifact name to load, used verbatim (pass the suffixed name a fit produced)
        #[arg(long)]
        tag: String,

        /// Number of components the artifact is expected to supply (0 skips removal)
        #[arg(long, default_value_t = 1)]
        rmpc: usize,

        /// Scale applied to stored components before removal
        #[arg(long, default_value_t = DEFAULT_DAMPING)]
        damping: f32,

        /// Directory holding component artifacts
        #[arg(long, default_value = DEFAULT_COMPONENT_DIR)]
        components_dir: PathBuf,

        /// SIF weighting parameter a in a / (a + p(w))
        #[arg(long, default_value_t = DEFAULT_SIF_PARAM)]
        weight_param: f32,

        /// Write embeddings as TSV, one sentence per row
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentsif=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fit {
            vectors,
            frequencies,
            sentences,
            tag,
            rmpc,
            components_dir,
            weight_param,
        } => run_fit(
            &vectors,
            frequencies.as_deref(),
            &sentences,
            &tag,
            rmpc,
            &components_dir,
            weight_param,
        ),
        Commands::Embed {
            vectors,
            frequencies,
            sentences,
            tag,
            rmpc,
            damping,
            components_dir,
            weight_param,
            output,
        } => run_embed(
            &vectors,
            frequencies.as_deref(),
            &sentences,
            &tag,
            rmpc,
            damping,
            &components_dir,
            weight_param,
            output.as_deref(),
        ),
    }
}

struct LoadedCorpus {
    table: WordVectorTable,
    batch: SentenceBatch,
    sentences: Vec<String>,
}

fn load_inputs(
    vectors: &Path,
    frequencies: Option<&Path>,
    sentences_path: &Path,
    weight_param: f32,
) -> Result<LoadedCorpus> {
    // Step 1: Word vectors
    let step1_start = Instant::now();
    println!("Step 1: Loading word vectors...");
    let (vocab, table) = load_word_vectors(vectors)?;
    println!(
        "✓ Loaded {} word vectors ({} dims) [{:.2}s]\n",
        table.len(),
        table.dim(),
        step1_start.elapsed().as_secs_f64()
    );

    // Step 2: Word weights
    let step2_start = Instant::now();
    println!("Step 2: Loading word frequencies...");
    let weights = match frequencies {
        Some(path) => {
            let weights = WordWeights::from_frequency_file(path, weight_param)?;
            println!(
                "✓ Loaded weights for {} words [{:.2}s]\n",
                weights.len(),
                step2_start.elapsed().as_secs_f64()
            );
            weights
        }
        None => {
            println!("✓ No frequency file given, averaging unweighted\n");
            WordWeights::uniform()
        }
    };

    // Step 3: Corpus
    let step3_start = Instant::now();
    println!("Step 3: Loading corpus...");
    let sentences = load_sentences(sentences_path)?;
    println!(
        "✓ Loaded {} sentences [{:.2}s]\n",
        sentences.len(),
        step3_start.elapsed().as_secs_f64()
    );

    // Step 4: Index sentences into the padded batch
    let step4_start = Instant::now();
    println!("Step 4: Indexing sentences...");
    let indexer = SentenceIndexer::new(&vocab, &weights);
    let batch = indexer.index(&sentences)?;
    println!(
        "✓ Indexed {} sentences ({} token slots each) [{:.2}s]\n",
        batch.len(),
        batch.width(),
        step4_start.elapsed().as_secs_f64()
    );

    Ok(LoadedCorpus {
        table,
        batch,
        sentences,
    })
}

fn run_fit(
    vectors: &Path,
    frequencies: Option<&Path>,
    sentences_path: &Path,
    tag: &str,
    rmpc: usize,
    components_dir: &Path,
    weight_param: f32,
) -> Result<()> {
    let start_time = Instant::now();
    println!("=== sentsif: fitting principal components ===\n");

    let loaded = load_inputs(vectors, frequencies, sentences_path, weight_param)?;

    // Step 5: Fit and persist
    let step5_start = Instant::now();
    println!("Step 5: Fitting principal components...");
    let params = SifParams {
        rmpc,
        damping: DEFAULT_DAMPING,
    };
    let store = ComponentStore::new(components_dir);
    let artifact = fit_components(&loaded.table, &loaded.batch, &params, &store, tag)
        .context("Component fit failed")?;

    let manifest_path = match &artifact {
        Some(path) => {
            println!(
                "✓ Saved {} component(s) to {} [{:.2}s]\n",
                rmpc,
                path.display(),
                step5_start.elapsed().as_secs_f64()
            );

            let manifest = FitManifest::new(
                tag,
                rmpc,
                loaded.table.dim(),
                loaded.batch.len(),
                corpus_digest(&loaded.sentences),
            );
            let manifest_path = write_fit_manifest(path, &manifest)?;
            println!("  Manifest: {}\n", manifest_path.display());
            Some(manifest_path)
        }
        None => {
            println!("✓ rmpc = 0, nothing to fit\n");
            None
        }
    };

    println!("=== Fit Statistics ===");
    println!("Words:                {}", loaded.table.len());
    println!("Dimensions:           {}", loaded.table.dim());
    println!("Sentences:            {}", loaded.batch.len());
    println!("Components:           {}", rmpc);
    if let Some(path) = &artifact {
        println!("Artifact:             {}", path.display());
    }
    if let Some(path) = &manifest_path {
        println!("Manifest:             {}", path.display());
    }
    println!(
        "Total execution:      {:.3}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_embed(
    vectors: &Path,
    frequencies: Option<&Path>,
    sentences_path: &Path,
    tag: &str,
    rmpc: usize,
    damping: f32,
    components_dir: &Path,
    weight_param: f32,
    output: Option<&Path>,
) -> Result<()> {
    let start_time = Instant::now();
    println!("=== sentsif: embedding sentences ===\n");

    let loaded = load_inputs(vectors, frequencies, sentences_path, weight_param)?;

    // Step 5: Embed
    let step5_start = Instant::now();
    println!("Step 5: Embedding sentences...");
    if rmpc > 0 {
        println!(
            "  Removing stored principal components from {} (damping {})...",
            tag, damping
        );
    }
    let params = SifParams { rmpc, damping };
    let store = ComponentStore::new(components_dir);
    let result = embed_sentences(&loaded.table, &loaded.batch, &params, &store, tag)
        .context("Embedding failed")?;
    let components_removed = result.components_removed;
    let embeddings = result.embeddings;
    println!(
        "✓ Embedded {} sentences [{:.2}s]\n",
        embeddings.len(),
        step5_start.elapsed().as_secs_f64()
    );

    if let Some(path) = output {
        write_embeddings_tsv(path, &embeddings)?;
        println!("✓ Wrote embeddings to {}\n", path.display());
    }

    let mean_norm = if embeddings.is_empty() {
        0.0
    } else {
        embeddings
            .iter()
            .map(|row| row.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt())
            .sum::<f64>()
            / embeddings.len() as f64
    };

    println!("=== Embedding Statistics ===");
    println!("Sentences:            {}", embeddings.len());
    println!("Dimensions:           {}", loaded.table.dim());
    println!("Components removed:   {}", components_removed);
    println!("Mean L2 norm:         {:.4}", mean_norm);
    if let Some(path) = output {
        println!("Output:               {}", path.display());
    }
    println!(
        "Total execution:      {:.3}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

fn write_embeddings_tsv(path: &Path, embeddings: &[Vec<f32>]) -> Result<()> {
    let mut out = String::new();
    for row in embeddings {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("Failed to write output: {}", path.display()))
}
