//! Note indexing: scan root → notes → lookup maps.
//!
//! Files are processed strictly one at a time. Each note waits for its file
//! read and, when enabled, its SEO generation before the next one starts, so
//! at most one model call is ever in flight.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use notescan_discovery::{SourceFile, discover};
use notescan_markdown::split_frontmatter;
use notescan_shared::{NoteScanError, ProcessedNode, Result, ScanOptions, ScanResult};

use crate::generator::{NoGenerator, TextGenerator};
use crate::seo::SeoGenerator;
use crate::slug::{file_name, slugify, title_from_path};

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting scan status.
pub trait ScanProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each note is indexed.
    fn note_processed(&self, path: &str, current: usize, total: usize);
    /// Called when the scan completes.
    fn done(&self, result: &ScanResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn note_processed(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &ScanResult) {}
}

// ---------------------------------------------------------------------------
// NoteIndexer
// ---------------------------------------------------------------------------

/// Builds a [`ScanResult`] from a directory of Markdown notes.
#[derive(Debug)]
pub struct NoteIndexer<G = NoGenerator> {
    options: ScanOptions,
    seo: Option<SeoGenerator<G>>,
}

impl NoteIndexer<NoGenerator> {
    /// An indexer without a text generator.
    pub fn new(options: ScanOptions) -> Self {
        Self { options, seo: None }
    }
}

impl<G: TextGenerator> NoteIndexer<G> {
    /// Attach the SEO generator used when `options.generate_seo` is set.
    pub fn with_seo_generator<H: TextGenerator>(self, seo: SeoGenerator<H>) -> NoteIndexer<H> {
        NoteIndexer {
            options: self.options,
            seo: Some(seo),
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Hand back the SEO generator, e.g. to shut its backend down.
    pub fn into_seo_generator(self) -> Option<SeoGenerator<G>> {
        self.seo
    }

    /// Scan the content root and build the note index.
    ///
    /// 1. Discover Markdown files (ignore patterns applied)
    /// 2. Read and index each file in enumeration order
    /// 3. Assemble the two lookup maps
    #[instrument(skip_all, fields(root = %self.options.content_path.display()))]
    pub async fn scan(&self, progress: &dyn ScanProgress) -> Result<ScanResult> {
        let start = Instant::now();

        if self.options.generate_seo && self.seo.is_none() {
            return Err(NoteScanError::config(
                "SEO generation is enabled but no text generator is configured",
            ));
        }

        // --- Phase 1: Discovery ---
        progress.phase("Discovering notes");
        let files = discover(&self.options.content_path, &self.options.ignore_patterns)?;
        let total = files.len();

        // --- Phase 2: Index each note ---
        progress.phase("Indexing notes");
        let mut index = IndexBuilder::default();
        for (i, file) in files.iter().enumerate() {
            let source = file.read().await?;
            let node = self.process_note(source).await?;
            progress.note_processed(&node.file_path, i + 1, total);
            index.insert(node);
        }

        let result = index.finish();

        info!(
            notes = result.all_notes.len(),
            seo = result.seo_count(),
            collisions = result.simple_slug_collisions().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan complete"
        );
        progress.done(&result);

        Ok(result)
    }

    /// Turn one source file into a node.
    async fn process_note(&self, source: SourceFile) -> Result<ProcessedNode> {
        let slugify = self.options.slugify.unwrap_or(slugify);

        let file_path = source.relative_path.replace('\\', "/");
        let title = title_from_path(&file_path);
        let full_path_slug = slugify(&file_path);
        let simple_slug = slugify(file_name(&file_path));

        let (body, frontmatter) = split_frontmatter(Path::new(&file_path), &source.content)?;

        let seo = match &self.seo {
            Some(generator) if self.options.generate_seo => {
                generator.generate(&title, &body).await.into_seo()
            }
            _ => None,
        };

        debug!(path = %file_path, slug = %full_path_slug, seo = seo.is_some(), "note indexed");

        Ok(ProcessedNode {
            id: full_path_slug.clone(),
            title,
            file_path,
            full_path_slug,
            simple_slug,
            content: self.options.include_content.then_some(body),
            frontmatter: self.options.include_frontmatter.then_some(frontmatter),
            last_modified: self
                .options
                .include_last_modified
                .then_some(source.last_modified),
            seo,
        })
    }
}

// ---------------------------------------------------------------------------
// Index assembly
// ---------------------------------------------------------------------------

/// Accumulates notes and both lookup maps.
#[derive(Debug, Default)]
struct IndexBuilder {
    result: ScanResult,
}

impl IndexBuilder {
    fn insert(&mut self, node: ProcessedNode) {
        let full = node.full_path_slug.clone();

        if let Some(previous) = self
            .result
            .notes_map_by_full_path_slug
            .insert(full.clone(), node.clone())
        {
            warn!(
                slug = %full,
                previous = %previous.file_path,
                current = %node.file_path,
                "duplicate full-path slug, later note replaces earlier one in lookup"
            );
        }

        let shared = self
            .result
            .notes_map_by_simple_slug
            .entry(node.simple_slug.clone())
            .or_default();
        shared.insert(full);
        if shared.len() > 1 {
            debug!(simple_slug = %node.simple_slug, notes = shared.len(), "simple slug collision");
        }

        self.result.all_notes.push(node);
    }

    fn finish(self) -> ScanResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::generator::scripted::{Reply, ScriptedGenerator};
    use crate::seo::SeoSettings;

    fn vault() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/vault")
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn file_paths(result: &ScanResult) -> Vec<&str> {
        result.all_notes.iter().map(|n| n.file_path.as_str()).collect()
    }

    fn assert_index_consistent(result: &ScanResult) {
        let mut union = BTreeSet::new();
        for full_slugs in result.notes_map_by_simple_slug.values() {
            for slug in full_slugs {
                assert!(
                    result.notes_map_by_full_path_slug.contains_key(slug),
                    "{slug} missing from full-path map"
                );
                union.insert(slug.clone());
            }
        }
        assert_eq!(union.len(), result.all_notes.len());
    }

    fn seo_indexer(
        options: ScanOptions,
        generator: ScriptedGenerator,
    ) -> NoteIndexer<ScriptedGenerator> {
        NoteIndexer::new(options)
            .with_seo_generator(SeoGenerator::new(generator, SeoSettings::default()))
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ScanProgress for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn note_processed(&self, path: &str, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("note:{current}/{total}:{path}"));
        }
        fn done(&self, result: &ScanResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", result.all_notes.len()));
        }
    }

    #[tokio::test]
    async fn scans_fixture_vault() {
        let result = NoteIndexer::new(ScanOptions::new(vault()))
            .scan(&SilentProgress)
            .await
            .unwrap();

        assert_eq!(
            file_paths(&result),
            vec![
                "My Folder/Another_Post with_Spaces.md",
                "a/note.md",
                "b/note.md",
                "한글 파일 이름.md",
            ]
        );

        let post = &result.all_notes[0];
        assert_eq!(post.id, "my-folder/another-post-with-spaces");
        assert_eq!(post.full_path_slug, "my-folder/another-post-with-spaces");
        assert_eq!(post.simple_slug, "another-post-with-spaces");
        assert_eq!(post.title, "Another_Post with_Spaces");
        assert!(post.seo.is_none());

        let korean = &result.all_notes[3];
        assert_eq!(korean.full_path_slug, "한글-파일-이름");
        assert_eq!(korean.title, "한글 파일 이름");

        assert_index_consistent(&result);
    }

    #[tokio::test]
    async fn same_file_name_in_two_folders_is_tracked() {
        let result = NoteIndexer::new(ScanOptions::new(vault()))
            .scan(&SilentProgress)
            .await
            .unwrap();

        let expected: BTreeSet<String> = ["a/note".to_string(), "b/note".to_string()].into();
        assert_eq!(result.notes_map_by_simple_slug.get("note"), Some(&expected));
        assert!(result.notes_map_by_full_path_slug.contains_key("a/note"));
        assert!(result.notes_map_by_full_path_slug.contains_key("b/note"));

        let collisions: Vec<_> = result.simple_slug_collisions().map(|(s, _)| s).collect();
        assert_eq!(collisions, vec!["note"]);
    }

    #[tokio::test]
    async fn optional_fields_follow_options() {
        let mut options = ScanOptions::new(vault());
        options.include_frontmatter = true;
        options.include_last_modified = true;

        let result = NoteIndexer::new(options).scan(&SilentProgress).await.unwrap();
        let post = &result.notes_map_by_full_path_slug["my-folder/another-post-with-spaces"];

        let frontmatter = post.frontmatter.as_ref().expect("frontmatter");
        assert_eq!(frontmatter["title"], "Another Post");
        assert_eq!(frontmatter["draft"], false);
        assert!(post.last_modified.is_some());

        let content = post.content.as_ref().expect("content");
        assert!(content.starts_with("# Another Post"));
        assert!(!content.contains("tags:"));

        let plain = &result.notes_map_by_full_path_slug["a/note"];
        assert_eq!(plain.frontmatter.as_ref().map(|f| f.len()), Some(0));
    }

    #[tokio::test]
    async fn optional_fields_absent_by_default() {
        let mut options = ScanOptions::new(vault());
        options.include_content = false;

        let result = NoteIndexer::new(options).scan(&SilentProgress).await.unwrap();
        for note in &result.all_notes {
            assert!(note.content.is_none());
            assert!(note.frontmatter.is_none());
            assert!(note.last_modified.is_none());
        }
    }

    #[tokio::test]
    async fn seo_attached_only_where_gates_pass() {
        let mut options = ScanOptions::new(vault());
        options.generate_seo = true;

        let indexer = seo_indexer(
            options,
            ScriptedGenerator::always("SEO Title: Spring Garden Prep\nMeta Description: Get beds ready."),
        );
        let result = indexer.scan(&SilentProgress).await.unwrap();

        let post = &result.notes_map_by_full_path_slug["my-folder/another-post-with-spaces"];
        let seo = post.seo.as_ref().expect("seo for long English note");
        assert_eq!(seo.title, "Spring Garden Prep");
        assert_eq!(seo.description.as_deref(), Some("Get beds ready."));

        // Short notes and the Korean note are gated out.
        assert!(result.notes_map_by_full_path_slug["a/note"].seo.is_none());
        assert!(result.notes_map_by_full_path_slug["한글-파일-이름"].seo.is_none());

        let generator = indexer.into_seo_generator().unwrap().into_generator();
        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        // Body only: front matter is not part of the excerpt.
        assert!(requests[0].prompt.contains("Content excerpt: # Another Post Spring"));
        assert!(requests[0].prompt.contains("Original title: Another_Post with_Spaces"));
    }

    #[tokio::test]
    async fn generation_failure_does_not_abort_scan() {
        let mut options = ScanOptions::new(vault());
        options.generate_seo = true;

        let result = seo_indexer(options, ScriptedGenerator::new([Reply::Fail("oom".into())]))
            .scan(&SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.all_notes.len(), 4);
        assert_eq!(result.seo_count(), 0);
    }

    #[tokio::test]
    async fn generator_unused_when_seo_disabled() {
        let indexer = seo_indexer(ScanOptions::new(vault()), ScriptedGenerator::always("SEO Title: x"));
        let result = indexer.scan(&SilentProgress).await.unwrap();

        assert_eq!(result.seo_count(), 0);
        let generator = indexer.into_seo_generator().unwrap().into_generator();
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn seo_enabled_without_generator_is_config_error() {
        let mut options = ScanOptions::new(vault());
        options.generate_seo = true;

        let err = NoteIndexer::new(options).scan(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, NoteScanError::Config { .. }));
    }

    #[tokio::test]
    async fn custom_slugify_is_used_for_both_slugs() {
        fn shout(input: &str) -> String {
            input.to_uppercase()
        }

        let mut options = ScanOptions::new(vault());
        options.slugify = Some(shout);

        let result = NoteIndexer::new(options).scan(&SilentProgress).await.unwrap();
        let note = &result.notes_map_by_full_path_slug["A/NOTE.MD"];
        assert_eq!(note.simple_slug, "NOTE.MD");
        assert_eq!(note.id, "A/NOTE.MD");
    }

    #[tokio::test]
    async fn duplicate_full_slug_keeps_later_note_in_map() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x y.md", "first");
        write(dir.path(), "x-y.md", "second");

        let result = NoteIndexer::new(ScanOptions::new(dir.path()))
            .scan(&SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.all_notes.len(), 2);
        assert_eq!(result.notes_map_by_full_path_slug.len(), 1);
        assert_eq!(result.notes_map_by_full_path_slug["x-y"].file_path, "x-y.md");
        assert_eq!(result.notes_map_by_simple_slug["x-y"].len(), 1);
    }

    #[tokio::test]
    async fn malformed_frontmatter_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.md", "---\n: [broken\n---\nbody");

        let err = NoteIndexer::new(ScanOptions::new(dir.path()))
            .scan(&SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, NoteScanError::Frontmatter { .. }));
    }

    #[tokio::test]
    async fn empty_root_gives_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let result = NoteIndexer::new(ScanOptions::new(dir.path()))
            .scan(&SilentProgress)
            .await
            .unwrap();
        assert!(result.all_notes.is_empty());
        assert!(result.notes_map_by_full_path_slug.is_empty());
        assert!(result.notes_map_by_simple_slug.is_empty());
    }

    #[tokio::test]
    async fn reports_progress_per_note() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "one.md", "1");
        write(dir.path(), "two.md", "2");

        let progress = RecordingProgress::default();
        NoteIndexer::new(ScanOptions::new(dir.path()))
            .scan(&progress)
            .await
            .unwrap();

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "phase:Discovering notes",
                "phase:Indexing notes",
                "note:1/2:one.md",
                "note:2/2:two.md",
                "done:2",
            ]
        );
    }
}
