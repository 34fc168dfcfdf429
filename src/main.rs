//! CLI entry point for query data preparation.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ndarray_npy::WriteNpyExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::PathBuf;

use query_prep::constants::EMBEDDING_DIM;
use query_prep::{
    normalize, BatchAssembler, EmbeddingMatrixBuilder, IdentityStemmer, KeyedVectors,
    LabelNames, LabeledCorpus, SequenceEncoder, Vocabulary, WordVectors,
};

#[derive(Parser, Debug)]
#[command(name = "query-prep")]
#[command(about = "Prepare query classification data: normalize, encode, pad and embed")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized form of a text
    Normalize {
        #[arg(short, long)]
        text: String,
    },
    /// Print the tokens and ids of a text
    Encode(EncodeArgs),
    /// Print per-class example counts of a corpus
    Stats {
        /// Path to corpus JSON file
        #[arg(short, long)]
        corpus: PathBuf,

        /// Path to label JSON file mapping names to class indices
        #[arg(short, long)]
        labels: Option<PathBuf>,
    },
    /// Encode and pad a labeled corpus into an .npz archive
    Tensorize(TensorizeArgs),
    /// Build the embedding matrix for a vocabulary as an .npy file
    Embed(EmbedArgs),
    /// Export a labeled corpus in fastText training format
    Fasttext {
        #[arg(short, long)]
        corpus: PathBuf,

        #[arg(short, long)]
        labels: PathBuf,

        #[arg(short, long, default_value = "train.txt")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Path to vocab.json file
    #[arg(long)]
    vocab: PathBuf,

    /// Text to encode; split on whitespace into words
    #[arg(short, long)]
    text: String,

    /// Skip the stemmer
    #[arg(long)]
    no_stem: bool,
}

#[derive(Args, Debug)]
struct TensorizeArgs {
    /// Path to vocab.json file
    #[arg(long)]
    vocab: PathBuf,

    /// Path to corpus JSON file
    #[arg(short, long)]
    corpus: PathBuf,

    /// Output .npz archive
    #[arg(short, long, default_value = "tensors.npz")]
    output: PathBuf,

    /// Value for padded positions (defaults to the vocabulary's <pad> id)
    #[arg(long, allow_hyphen_values = true)]
    pad_fill: Option<i64>,

    /// Skip the stemmer
    #[arg(long)]
    no_stem: bool,
}

#[derive(Args, Debug)]
struct EmbedArgs {
    /// Path to vocab.json file
    #[arg(long)]
    vocab: PathBuf,

    /// Pretrained word2vec file
    #[arg(short = 'w', long)]
    vectors: PathBuf,

    /// Read the vectors as word2vec text instead of binary
    #[arg(long)]
    text_format: bool,

    /// Output .npy file
    #[arg(short, long, default_value = "embeddings.npy")]
    output: PathBuf,

    /// Seed for the <unk> row
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("query_prep=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Normalize { text } => {
            println!("{}", normalize(&text));
        }
        Command::Encode(args) => run_encode(args)?,
        Command::Stats { corpus, labels } => {
            let corpus = LabeledCorpus::load(&corpus).context("Failed to load corpus")?;
            let names = labels
                .map(|path| LabelNames::load(&path))
                .transpose()
                .context("Failed to load labels")?;
            println!("{}", corpus.summary(names.as_ref())?);
        }
        Command::Tensorize(args) => run_tensorize(args)?,
        Command::Embed(args) => run_embed(args)?,
        Command::Fasttext {
            corpus,
            labels,
            output,
        } => {
            let corpus = LabeledCorpus::load(&corpus).context("Failed to load corpus")?;
            let names = LabelNames::load(&labels).context("Failed to load labels")?;
            corpus.write_fasttext(&names, &output)?;
            println!("Wrote {} examples to {:?}", corpus.example_count(), output);
        }
    }

    Ok(())
}

fn encoder(vocab: &Vocabulary, no_stem: bool) -> SequenceEncoder<'_> {
    if no_stem {
        SequenceEncoder::with_stemmer(vocab, Box::new(IdentityStemmer))
    } else {
        SequenceEncoder::new(vocab)
    }
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let vocab = Vocabulary::load(&args.vocab).context("Failed to load vocabulary")?;
    let encoder = encoder(&vocab, args.no_stem);

    let words: Vec<&str> = args.text.split_whitespace().collect();
    println!("Tokens: {:?}", encoder.tokens(&words));
    println!("Token IDs: {:?}", encoder.encode(&words));
    Ok(())
}

fn run_tensorize(args: TensorizeArgs) -> Result<()> {
    println!("Loading vocabulary from {:?}...", args.vocab);
    let vocab = Vocabulary::load(&args.vocab).context("Failed to load vocabulary")?;

    println!("Loading corpus from {:?}...", args.corpus);
    let corpus = LabeledCorpus::load(&args.corpus).context("Failed to load corpus")?;
    println!("{}", corpus.summary(None)?);

    let mut assembler = BatchAssembler::new(encoder(&vocab, args.no_stem));
    if let Some(pad_fill) = args.pad_fill {
        assembler = assembler.with_pad_fill(pad_fill);
    }

    let batch = assembler.assemble(&corpus).context("Failed to assemble batch")?;
    println!(
        "Assembled {} rows of length {} (pad fill {})",
        batch.len(),
        batch.seq_len(),
        assembler.pad_fill()
    );

    batch.save_npz(&args.output)?;
    println!("Saved tensors to {:?}", args.output);
    Ok(())
}

fn run_embed(args: EmbedArgs) -> Result<()> {
    println!("Loading vocabulary from {:?}...", args.vocab);
    let vocab = Vocabulary::load(&args.vocab).context("Failed to load vocabulary")?;

    println!("Loading word vectors from {:?}...", args.vectors);
    let vectors = KeyedVectors::load(&args.vectors, !args.text_format)
        .context("Failed to load word vectors")?;

    if vectors.dim() != EMBEDDING_DIM {
        tracing::warn!(
            dim = vectors.dim(),
            "word vectors are not {}-dimensional",
            EMBEDDING_DIM
        );
    }
    let builder = EmbeddingMatrixBuilder::new(&vocab).with_dim(vectors.dim());
    let matrix = match args.seed {
        Some(seed) => builder.build_with_rng(&vectors, &mut StdRng::seed_from_u64(seed)),
        None => builder.build(&vectors),
    }
    .context("Failed to build embedding matrix")?;
    println!("Built embedding matrix of shape {:?}", matrix.shape());

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {:?}", args.output))?;
    matrix
        .write_npy(file)
        .context("Failed to write embedding matrix")?;
    println!("Saved embeddings to {:?}", args.output);
    Ok(())
}
