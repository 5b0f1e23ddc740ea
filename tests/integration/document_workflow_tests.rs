/*!
 * End-to-end document correction tests
 */

use anyhow::Result;
use zhcorrect::app_controller::{FixedPasswordPrompt, NoPasswordPrompt};
use zhcorrect::errors::{AppError, DocumentError};
use zhcorrect::file_utils::FileManager;
use crate::common;
use crate::common::docx_fixtures::write_docx;

/// Test open, auto-correct and save of a plain document
#[tokio::test]
async fn test_open_document_withPlainDocx_shouldCorrectAndSave() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = write_docx(temp_dir.path(), "會議.docx", &["这个软件开发项目", "讨论国语"])?;

    let controller = common::mock_controller(&["软件"]);
    assert!(controller.open_document(&input, None, &NoPasswordPrompt).await?);
    assert_eq!(controller.text(), "這個软件開發項目\n\n討論國語");

    let output = FileManager::generate_output_path(&input, temp_dir.path(), "corrected", "txt");
    controller.save_text(&output)?;
    assert_eq!(std::fs::read_to_string(&output)?, "這個软件開發項目\n\n討論國語");
    Ok(())
}

/// Test that a missing file leaves the previous text in place
#[tokio::test]
async fn test_open_document_withMissingFile_shouldKeepPreviousText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = common::mock_controller(&[]);
    controller.set_text("舊內容");

    let result = controller
        .open_document(temp_dir.path().join("gone.docx"), None, &NoPasswordPrompt)
        .await;

    assert!(matches!(result, Err(AppError::Document(DocumentError::NotFound(_)))));
    assert_eq!(controller.text(), "舊內容");
    assert!(controller.status().contains("File not found"));
    Ok(())
}

/// Test that an empty document does not replace the text
#[tokio::test]
async fn test_open_document_withEmptyDocument_shouldReportNoText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = write_docx(temp_dir.path(), "empty.docx", &["   "])?;
    let controller = common::mock_controller(&[]);
    controller.set_text("keep");

    assert!(!controller.open_document(&input, None, &NoPasswordPrompt).await?);
    assert_eq!(controller.text(), "keep");
    assert!(controller.status().starts_with("No text found"));
    Ok(())
}

/// Test that a plain document never triggers the password prompt
#[test]
fn test_load_document_withPlainDocx_shouldNotCorrect() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = write_docx(temp_dir.path(), "plain.docx", &["这个"])?;
    let controller = common::mock_controller(&[]);

    let loaded = controller.load_document(&input, None, &FixedPasswordPrompt("unused".to_string()))?;
    assert!(loaded);
    assert_eq!(controller.text(), "这个");
    assert!(controller.status().starts_with("Loaded"));
    Ok(())
}
