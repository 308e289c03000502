//! Entity dictionary extraction
//!
//! Case-insensitive word-boundary matching of curated dataset, method,
//! task, and metric name lists against title + abstract. Batch
//! extraction merges identical entities across papers into one row set
//! plus junction links suitable for a single transactional insert.

use papergraph_common::models::{EntityRecord, Paper, PaperEntityLink};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const DATASETS: &[&str] = &[
    "ImageNet", "CIFAR-10", "CIFAR-100", "MNIST", "Fashion-MNIST", "COCO", "Pascal VOC",
    "SQuAD", "GLUE", "SuperGLUE", "WMT", "LibriSpeech", "Switchboard", "TIMIT", "WikiText",
    "Penn Treebank", "CoNLL-2003", "OntoNotes", "SNLI", "MultiNLI", "TriviaQA",
    "Natural Questions", "HotpotQA", "MS MARCO", "KITTI", "Cityscapes", "ADE20K", "CelebA",
    "LFW", "UCF101", "Kinetics", "AudioSet", "C4", "The Pile", "LAION", "OpenWebText",
    "BookCorpus", "Common Crawl", "VQA", "Visual Genome",
];

pub const METHODS: &[&str] = &[
    "transformer", "self-attention", "attention mechanism", "convolutional neural network",
    "CNN", "recurrent neural network", "RNN", "LSTM", "GRU", "BERT", "GPT", "ResNet", "VGG",
    "AlexNet", "U-Net", "generative adversarial network", "GAN", "variational autoencoder",
    "VAE", "diffusion model", "reinforcement learning", "Q-learning", "policy gradient",
    "actor-critic", "PPO", "dropout", "batch normalization", "layer normalization",
    "word2vec", "GloVe", "ELMo", "seq2seq", "beam search", "contrastive learning",
    "knowledge distillation", "transfer learning", "fine-tuning", "prompt tuning", "LoRA",
    "mixture of experts",
];

pub const TASKS: &[&str] = &[
    "image classification", "object detection", "semantic segmentation",
    "instance segmentation", "machine translation", "speech recognition",
    "question answering", "named entity recognition", "sentiment analysis",
    "text summarization", "language modeling", "image generation", "pose estimation",
    "face recognition", "anomaly detection", "link prediction", "node classification",
    "text classification", "information retrieval", "speech synthesis",
];

pub const METRICS: &[&str] = &[
    "accuracy", "precision", "recall", "F1 score", "BLEU", "ROUGE", "METEOR", "perplexity",
    "word error rate", "mean average precision", "mAP", "IoU", "AUC", "mean squared error",
    "RMSE", "MAE", "top-1 accuracy", "top-5 accuracy", "exact match", "MRR", "NDCG",
];

fn role_for(entity_type: &str) -> &'static str {
    match entity_type {
        "dataset" => "uses",
        "method" => "applies",
        _ => "evaluates",
    }
}

/// One compiled dictionary entry
struct DictEntry {
    entity_type: &'static str,
    name: &'static str,
    pattern: Regex,
}

/// Dictionary extractor with precompiled word-boundary regexes
pub struct EntityExtractor {
    entries: Vec<DictEntry>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        let mut entries = Vec::new();
        let dictionaries: [(&str, &[&str]); 4] = [
            ("dataset", DATASETS),
            ("method", METHODS),
            ("task", TASKS),
            ("metric", METRICS),
        ];
        for (entity_type, names) in dictionaries {
            for name in names {
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)))
                    .expect("dictionary entry compiles");
                entries.push(DictEntry {
                    entity_type,
                    name,
                    pattern,
                });
            }
        }
        Self { entries }
    }

    /// Match one paper's title + abstract against every dictionary
    /// entry; duplicates collapse on (type, lowercased name).
    pub fn extract(&self, paper: &Paper) -> Vec<(&'static str, &'static str)> {
        let text = format!(
            "{} {}",
            paper.title,
            paper.abstract_text.as_deref().unwrap_or("")
        );
        let mut seen: HashSet<(&str, String)> = HashSet::new();
        let mut found = Vec::new();
        for entry in &self.entries {
            if entry.pattern.is_match(&text)
                && seen.insert((entry.entity_type, entry.name.to_lowercase()))
            {
                found.push((entry.entity_type, entry.name));
            }
        }
        found
    }

    /// Extract over all papers, merging identical entities into one row
    /// list and emitting links referencing entity list indices.
    pub fn extract_batch(&self, papers: &[Paper]) -> (Vec<EntityRecord>, Vec<PaperEntityLink>) {
        let mut entities: Vec<EntityRecord> = Vec::new();
        let mut entity_index: HashMap<(String, String), usize> = HashMap::new();
        let mut links = Vec::new();

        for paper in papers {
            let Some(paper_id) = paper.id else { continue };
            for (entity_type, name) in self.extract(paper) {
                let key = (entity_type.to_string(), name.to_lowercase());
                let index = *entity_index.entry(key).or_insert_with(|| {
                    entities.push(EntityRecord {
                        id: None,
                        name: name.to_string(),
                        entity_type: entity_type.to_string(),
                        aliases: Vec::new(),
                    });
                    entities.len() - 1
                });
                links.push(PaperEntityLink {
                    paper_id,
                    entity_index: index,
                    role: role_for(entity_type).to_string(),
                });
            }
        }

        debug!(
            entities = entities.len(),
            links = links.len(),
            "Entity extraction complete"
        );
        (entities, links)
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}
