//! End-to-end ingestion runs against mock adapters and an in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;
use intelharvest::links::CandidateLink;
use intelharvest::pipeline::IngestPipeline;
use intelharvest::sources::{
    ArchiveReport, FetchError, PageFetcher, PdfBlob, RepoHarvester, RepoRef, ReportArchive,
};
use intelharvest::store::MemoryReportStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Build a minimal but well-formed single-page PDF whose content stream
/// draws `text` with a base-14 font, with a correct xref table so
/// pdf-extract can parse it.
fn pdf_with_text(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", text);
    let objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ),
    ];

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

fn article_html(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect();
    format!(
        "<!DOCTYPE html><html><head><title>Report</title></head>\
         <body><article>{}</article></body></html>",
        body
    )
}

struct MockWeb {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for MockWeb {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

struct MockRepo {
    blobs: Vec<PdfBlob>,
    /// Raw URLs that fail to download.
    broken: Vec<String>,
    downloads: AtomicU64,
}

impl MockRepo {
    fn empty() -> Self {
        Self {
            blobs: Vec::new(),
            broken: Vec::new(),
            downloads: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl RepoHarvester for MockRepo {
    async fn list_pdf_blobs(&self, _repo: &RepoRef) -> Result<Vec<PdfBlob>, FetchError> {
        Ok(self.blobs.clone())
    }

    async fn download_blob(&self, blob: &PdfBlob) -> Result<Vec<u8>, FetchError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(&blob.raw_url) {
            return Err(FetchError::Status {
                status: 500,
                url: blob.raw_url.clone(),
            });
        }
        // Bodies share no tokens so dedup never collapses them
        let body = match blob.path.as_str() {
            p if p.ends_with("1.pdf") => "spearphishing lures target finance executives",
            p if p.ends_with("2.pdf") => "ransomware affiliates abuse remote monitoring tools",
            p if p.ends_with("4.pdf") => "botnet operators rotate bulletproof hosting weekly",
            _ => "wiper malware destroys industrial control backups",
        };
        Ok(pdf_with_text(body))
    }
}

struct MockArchive {
    /// Pages keyed by offset; any other offset is exhaustion.
    pages: HashMap<u64, Vec<ArchiveReport>>,
    page_size: u64,
    calls: AtomicU64,
}

#[async_trait]
impl ReportArchive for MockArchive {
    async fn fetch_page(&self, offset: u64) -> Result<Option<Vec<ArchiveReport>>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.get(&offset).cloned())
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }
}

fn report(id: &str, text: &str) -> ArchiveReport {
    ArchiveReport {
        id: id.to_string(),
        plain_text: text.to_string(),
    }
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()
}

fn link(url: &str) -> CandidateLink {
    CandidateLink {
        link: url.to_string(),
        date: run_date(),
    }
}

#[tokio::test]
async fn pagination_stops_at_first_empty_page() {
    let mut pages = HashMap::new();
    pages.insert(0, vec![report("a", "first archive body about loaders")]);
    pages.insert(1, vec![report("b", "second archive body about implants")]);
    pages.insert(2, vec![report("c", "third archive body about phishing kits")]);

    let archive = Arc::new(MockArchive {
        pages,
        page_size: 1,
        calls: AtomicU64::new(0),
    });
    let store = Arc::new(MemoryReportStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(MockWeb {
            pages: HashMap::new(),
        }),
        Arc::new(MockRepo::empty()),
        Some(archive.clone()),
        store.clone(),
        0.3,
        run_date(),
    )
    .unwrap();

    let stats = pipeline.run(Vec::new()).await;

    // Three pages of items, then the fourth (empty) call ends the walk
    assert_eq!(archive.calls.load(Ordering::SeqCst), 4);
    assert_eq!(stats.persisted, 3);
    assert_eq!(store.reports().len(), 3);
}

#[tokio::test]
async fn archive_error_aborts_walk_not_the_run() {
    struct OutageArchive {
        calls: AtomicU64,
    }

    #[async_trait]
    impl ReportArchive for OutageArchive {
        async fn fetch_page(&self, offset: u64) -> Result<Option<Vec<ArchiveReport>>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match offset {
                0 => Ok(Some(vec![report("a", "archive body before the outage")])),
                _ => Err(FetchError::Status {
                    status: 503,
                    url: "https://archive.example/entries".to_string(),
                }),
            }
        }

        fn page_size(&self) -> u64 {
            1
        }
    }

    let archive = Arc::new(OutageArchive {
        calls: AtomicU64::new(0),
    });
    let store = Arc::new(MemoryReportStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(MockWeb {
            pages: HashMap::new(),
        }),
        Arc::new(MockRepo::empty()),
        Some(archive.clone()),
        store.clone(),
        0.3,
        run_date(),
    )
    .unwrap();

    let stats = pipeline.run(Vec::new()).await;

    // A non-success page ends the whole walk; no page after the error is
    // requested and everything before it stays ingested
    assert_eq!(archive.calls.load(Ordering::SeqCst), 2);
    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(store.reports().len(), 1);
}

#[tokio::test]
async fn github_blob_failure_is_isolated() {
    let blobs: Vec<PdfBlob> = (1..=5)
        .map(|i| PdfBlob {
            path: format!("reports/apt{}.pdf", i),
            raw_url: format!("https://raw.example/owner/repo/main/reports/apt{}.pdf", i),
        })
        .collect();
    let repo = Arc::new(MockRepo {
        broken: vec![blobs[2].raw_url.clone()],
        blobs,
        downloads: AtomicU64::new(0),
    });

    let store = Arc::new(MemoryReportStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(MockWeb {
            pages: HashMap::new(),
        }),
        repo.clone(),
        None,
        store.clone(),
        0.3,
        run_date(),
    )
    .unwrap();

    let stats = pipeline
        .run(vec![link("https://github.com/owner/repo")])
        .await;

    // Every blob was attempted despite #3 failing mid-sequence
    assert_eq!(repo.downloads.load(Ordering::SeqCst), 5);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.persisted, 4);
    assert_eq!(store.reports().len(), 4);

    let links: Vec<_> = store.reports().iter().map(|r| r.source_link.clone()).collect();
    assert!(!links.iter().any(|l| l.contains("apt3.pdf")));
}

#[tokio::test]
async fn archive_duplicates_of_web_documents_are_caught() {
    let paragraphs = [
        "Researchers observed a spearphishing wave delivering a previously \
         undocumented loader to energy sector organizations across several regions",
        "The second stage beacons to freshly registered infrastructure and \
         retrieves an additional payload staged on compromised hosting",
    ];
    let page_url = "https://vendor.example/blog/energy-campaign";

    let mut pages = HashMap::new();
    pages.insert(page_url.to_string(), article_html(&paragraphs));

    let mut archive_pages = HashMap::new();
    archive_pages.insert(0, vec![report("dup-1", &paragraphs.join(" "))]);

    let store = Arc::new(MemoryReportStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(MockWeb { pages }),
        Arc::new(MockRepo::empty()),
        Some(Arc::new(MockArchive {
            pages: archive_pages,
            page_size: 25,
            calls: AtomicU64::new(0),
        })),
        store.clone(),
        0.3,
        run_date(),
    )
    .unwrap();

    let stats = pipeline.run(vec![link(page_url)]).await;

    // The archive record repeats the web article and is skipped, because
    // the archive walk shares the dedup index warmed during link processing
    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.skipped_duplicate, 1);
    assert_eq!(store.reports().len(), 1);
    assert_eq!(store.reports()[0].source_link, page_url);
}

#[tokio::test]
async fn failed_link_does_not_halt_the_run() {
    let good_url = "https://vendor.example/blog/good-report";
    let mut pages = HashMap::new();
    pages.insert(
        good_url.to_string(),
        article_html(&[
            "A long writeup describing command and control infrastructure used \
             by the operators including several staging servers and the domains \
             they rotated through during the intrusion",
        ]),
    );

    let store = Arc::new(MemoryReportStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(MockWeb { pages }),
        Arc::new(MockRepo::empty()),
        None,
        store.clone(),
        0.3,
        run_date(),
    )
    .unwrap();

    let stats = pipeline
        .run(vec![
            link("https://dead.example/unreachable"),
            link(good_url),
        ])
        .await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.total(), 2);
}

#[tokio::test]
async fn stored_reports_carry_indicators_and_date() {
    let mut pages = HashMap::new();
    let url = "https://vendor.example/blog/ioc-report";
    pages.insert(
        url.to_string(),
        article_html(&[
            "The implant contacted 198.51.100.23 and resolved staging.evil-domain.com \
             before dropping a payload with hash d41d8cd98f00b204e9800998ecf8427e \
             onto the compromised workstation fleet",
        ]),
    );

    let store = Arc::new(MemoryReportStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(MockWeb { pages }),
        Arc::new(MockRepo::empty()),
        None,
        store.clone(),
        0.3,
        run_date(),
    )
    .unwrap();

    let stats = pipeline.run(vec![link(url)]).await;
    assert_eq!(stats.persisted, 1);

    let reports = store.reports();
    let stored = &reports[0];
    assert_eq!(stored.ingestion_date, "2026/08/28");
    assert!(stored.ip_addrs.contains(&"198.51.100.23".to_string()));
    assert!(stored
        .domains
        .contains(&"staging.evil-domain.com".to_string()));
    assert!(stored
        .hashes
        .contains(&"d41d8cd98f00b204e9800998ecf8427e".to_string()));
    assert!(!stored.fingerprint.is_empty());
}
