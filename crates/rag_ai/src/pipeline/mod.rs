use rag_core::chunking::chunk_by_paragraphs;
use rag_core::citations::{splice_with, DocumentIdDecoder};
use rag_core::domain::{Chunk, Citation, DocumentRecord, GradeResult, GradingSample};
use rag_core::error::{AppError, GRADING_PARSE_FAILED};
use rag_core::grading::{accuracy, grading_prompt, parse_grade};
use rag_core::rank::{rank_of_golden_by_ids, summarize_ranks, RankSummary};
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::embeddings::{Embedder, InputType};
use crate::guardrails::{enforce_citation_targets, enforce_citations_present};
use crate::index::{SearchHit, VectorIndex};
use crate::llm::{ChatModel, ChatRequest};
use crate::rerank::Reranker;

mod prompts;

pub use prompts::{grounded_answer_preamble, legal_context_preamble};

/// Cutoffs reported in evaluation hit rates.
pub const EVAL_HIT_RATE_KS: [usize; 4] = [1, 3, 5, 10];

/// A passage that survived reranking, in final (reranked) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub chunk_id: String,
    pub source_document: String,
    pub text: String,
    pub rank: usize,
    pub relevance_score: f32,
    pub vector_rank: usize,
    pub vector_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    /// Vector-search candidates before reranking.
    pub candidates: Vec<SearchHit>,
    pub passages: Vec<RetrievedPassage>,
}

impl Retrieval {
    /// Candidate chunk ids in vector-search order.
    pub fn candidate_ids(&self) -> Vec<&str> {
        self.candidates.iter().map(|h| h.chunk.chunk_id.as_str()).collect()
    }

    /// Passage chunk ids in reranked order.
    pub fn passage_ids(&self) -> Vec<&str> {
        self.passages.iter().map(|p| p.chunk_id.as_str()).collect()
    }

    /// Passage texts joined into one reference block for grading.
    pub fn reference_block(&self) -> String {
        self.passages
            .iter()
            .map(|p| format!("source={}\n{}", p.source_document, p.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text with citation markers spliced in.
    pub text: String,
    pub raw_text: String,
    pub citations: Vec<Citation>,
    pub documents: Vec<DocumentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenRanks {
    pub retrieval: usize,
    pub reranked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub golden_document: String,
    pub golden_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub question: String,
    pub ranks: GoldenRanks,
    pub answer: String,
    pub grade: Option<GradeResult>,
    pub grading_error: Option<AppError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub retrieval: RankSummary,
    pub reranked: RankSummary,
    pub accuracy: f64,
    pub graded: usize,
    pub skipped: usize,
    pub cases: Vec<CaseResult>,
}

/// Everything one workflow run needs, passed explicitly instead of living in globals.
pub struct PipelineContext<'a> {
    embedder: &'a dyn Embedder,
    reranker: &'a dyn Reranker,
    chat: &'a dyn ChatModel,
    config: RagConfig,
    id_decoder: Box<dyn DocumentIdDecoder + 'a>,
    index: VectorIndex,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        reranker: &'a dyn Reranker,
        chat: &'a dyn ChatModel,
        config: RagConfig,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            embedder,
            reranker,
            chat,
            id_decoder: Box::new(config.id_decoder()),
            config,
            index: VectorIndex::new(),
        })
    }

    /// Replace the decoder built from `citation_id_prefix_len` for services with another id scheme.
    pub fn with_id_decoder(mut self, decoder: impl DocumentIdDecoder + 'a) -> Self {
        self.id_decoder = Box::new(decoder);
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Split a corpus document into paragraph chunks, embed them and add them to the index.
    /// Returns the number of chunks produced.
    pub fn ingest_document(&mut self, source_document: &str, text: &str) -> Result<usize, AppError> {
        let chunks = chunk_by_paragraphs(text, self.config.max_chunk_chars);
        if chunks.is_empty() {
            tracing::warn!(source = source_document, "document has no text; skipped");
            return Ok(0);
        }
        let vectors = self
            .embedder
            .embed(&self.config.embed_model, &chunks, InputType::SearchDocument)?;
        if vectors.len() != chunks.len() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedder returned a different number of vectors than chunks",
            )
            .with_details(format!("chunks={}; vectors={}", chunks.len(), vectors.len())));
        }
        for (ordinal, (text, vector)) in chunks.iter().zip(vectors).enumerate() {
            self.index.add(source_document, ordinal as u32, text, vector)?;
        }
        tracing::info!(source = source_document, chunks = chunks.len(), "indexed document");
        Ok(chunks.len())
    }

    /// Vector search for `top_k` candidates, then rerank down to `top_n` passages.
    pub fn retrieve(&self, question: &str) -> Result<Retrieval, AppError> {
        let q = question.trim();
        if q.is_empty() {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Question must not be empty"));
        }

        let qv = self
            .embedder
            .embed_one(&self.config.embed_model, q, InputType::SearchQuery)?;
        let candidates = self.index.search(&qv, self.config.top_k)?;
        let texts: Vec<String> = candidates.iter().map(|h| h.chunk.text.clone()).collect();
        let hits = self
            .reranker
            .rerank(&self.config.rerank_model, q, &texts, self.config.top_n)?;

        let mut passages = Vec::with_capacity(hits.len().min(self.config.top_n));
        for hit in hits.into_iter().take(self.config.top_n) {
            let cand = candidates.get(hit.index).ok_or_else(|| {
                AppError::new("AI_RERANK_FAILED", "Rerank result points outside the candidates")
                    .with_details(format!("index={}; candidates={}", hit.index, candidates.len()))
            })?;
            passages.push(RetrievedPassage {
                chunk_id: cand.chunk.chunk_id.clone(),
                source_document: cand.chunk.source_document.clone(),
                text: cand.chunk.text.clone(),
                rank: passages.len() + 1,
                relevance_score: hit.relevance_score,
                vector_rank: cand.rank,
                vector_score: cand.score,
            });
        }
        tracing::debug!(candidates = candidates.len(), passages = passages.len(), "retrieved");
        Ok(Retrieval {
            candidates,
            passages,
        })
    }

    /// Answer `question` grounded on already-retrieved passages.
    pub fn answer_from(&self, question: &str, retrieval: &Retrieval) -> Result<Answer, AppError> {
        let documents = retrieval
            .passages
            .iter()
            .map(|p| DocumentRecord::passage(p.text.clone(), p.chunk_id.clone()))
            .collect();
        let req = ChatRequest::new(&self.config.chat_model, question)
            .with_preamble(grounded_answer_preamble())
            .with_documents(documents);
        self.complete(req)
    }

    pub fn answer(&self, question: &str) -> Result<Answer, AppError> {
        let retrieval = self.retrieve(question)?;
        self.answer_from(question, &retrieval)
    }

    /// Context/instruction split: labelled chunks go out as `{title, snippet}` documents and
    /// `instruction` is the message.
    pub fn answer_with_context(&self, instruction: &str, chunks: &[Chunk]) -> Result<Answer, AppError> {
        let req = ChatRequest::new(&self.config.chat_model, instruction)
            .with_preamble(legal_context_preamble())
            .with_documents(chunks.iter().map(DocumentRecord::from).collect());
        self.complete(req)
    }

    fn complete(&self, req: ChatRequest) -> Result<Answer, AppError> {
        let resp = self.chat.chat(&req)?;
        let document_count = req.documents.len();
        if self.config.require_citations {
            enforce_citations_present(&resp.citations, document_count)?;
        }
        let decoder = self.id_decoder.as_ref();
        enforce_citation_targets(&resp.citations, document_count, decoder)?;

        // Service output is not guaranteed sorted; the splicer still rejects overlaps.
        let mut citations = resp.citations;
        citations.sort_by_key(|c| (c.start, c.end));
        let text = splice_with(&resp.text, &citations, decoder, self.config.renumber_citations)?;

        Ok(Answer {
            text,
            raw_text: resp.text,
            citations,
            documents: req.documents,
        })
    }

    /// Where the golden document landed, before and after reranking.
    ///
    /// Retrieved chunk ids are resolved through this context's index, so a retrieval made
    /// against another index fails with `RANK_UNKNOWN_IDENTIFIER`.
    pub fn golden_ranks(&self, retrieval: &Retrieval, golden_document: &str) -> Result<GoldenRanks, AppError> {
        let id_to_source = self.index.id_to_source();
        let normalizer = &self.config.source_normalizer;
        Ok(GoldenRanks {
            retrieval: rank_of_golden_by_ids(
                golden_document,
                &retrieval.candidate_ids(),
                &id_to_source,
                normalizer,
                self.config.top_k + 1,
            )?,
            reranked: rank_of_golden_by_ids(
                golden_document,
                &retrieval.passage_ids(),
                &id_to_source,
                normalizer,
                self.config.not_found_rank(),
            )?,
        })
    }

    /// Reranked rank of `golden_document` for a fresh retrieval of `question`.
    pub fn golden_rank(&self, question: &str, golden_document: &str) -> Result<usize, AppError> {
        let retrieval = self.retrieve(question)?;
        Ok(self.golden_ranks(&retrieval, golden_document)?.reranked)
    }

    pub fn grade(&self, sample: &GradingSample) -> Result<GradeResult, AppError> {
        let raw = self
            .chat
            .generate(&self.config.grader_model, &grading_prompt(sample))?;
        parse_grade(&raw)
    }

    /// Retrieve, answer and grade every case. Unparseable grades are counted as skipped and
    /// never retried; any other failure aborts the run.
    pub fn evaluate(&self, cases: &[EvalCase]) -> Result<EvaluationReport, AppError> {
        let mut results = Vec::with_capacity(cases.len());
        let mut grades = Vec::new();

        for case in cases {
            let retrieval = self.retrieve(&case.question)?;
            let ranks = self.golden_ranks(&retrieval, &case.golden_document)?;
            let answer = self.answer_from(&case.question, &retrieval)?;

            let sample = GradingSample {
                question: case.question.clone(),
                golden_answer: case.golden_answer.clone(),
                reference: retrieval.reference_block(),
                completion: answer.raw_text.clone(),
            };
            let (grade, grading_error) = match self.grade(&sample) {
                Ok(g) => {
                    grades.push(g.clone());
                    (Some(g), None)
                }
                Err(e) if e.is(GRADING_PARSE_FAILED) => {
                    tracing::warn!(question = %case.question, error = %e, "grade skipped");
                    (None, Some(e))
                }
                Err(e) => return Err(e),
            };

            results.push(CaseResult {
                question: case.question.clone(),
                ranks,
                answer: answer.text,
                grade,
                grading_error,
            });
        }

        let retrieval_ranks: Vec<usize> = results.iter().map(|r| r.ranks.retrieval).collect();
        let reranked_ranks: Vec<usize> = results.iter().map(|r| r.ranks.reranked).collect();
        let report = EvaluationReport {
            retrieval: summarize_ranks(&retrieval_ranks, self.config.top_k + 1, &EVAL_HIT_RATE_KS),
            reranked: summarize_ranks(&reranked_ranks, self.config.not_found_rank(), &EVAL_HIT_RATE_KS),
            accuracy: accuracy(&grades),
            graded: grades.len(),
            skipped: results.len() - grades.len(),
            cases: results,
        };
        tracing::info!(
            cases = cases.len(),
            accuracy = report.accuracy,
            skipped = report.skipped,
            mrr = report.reranked.mrr,
            "evaluation finished"
        );
        Ok(report)
    }
}
