// End-to-end tests for the Narrator Backend API
//
// Each test gets its own temporary storage directories and a router served on
// an ephemeral port. Speech engines, the ffmpeg transcoder and the PDF
// extractor are replaced by in-process fakes, so no network access or external
// binaries are needed and tests run in parallel.

mod helpers;
mod test_articles;
mod test_health;
mod test_tasks;
mod test_upload;
