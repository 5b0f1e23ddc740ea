/*!
 * Tests for password-protected documents
 */

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::path::Path;
use zhcorrect::app_controller::{NoPasswordPrompt, PasswordPrompt};
use zhcorrect::document::DocumentSource;
use zhcorrect::errors::{AppError, DocumentError};
use crate::common;
use crate::common::docx_fixtures::{agile_container, write_encrypted_docx};

/// Prompt that answers once and counts how often it was asked
struct CountingPrompt {
    answer: Option<String>,
    asked: AtomicUsize,
}

impl CountingPrompt {
    fn new(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            asked: AtomicUsize::new(0),
        }
    }
}

impl PasswordPrompt for CountingPrompt {
    fn ask_password(&self, _path: &Path) -> Option<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Test decryption with the right password
#[test]
fn test_extract_withCorrectPassword_shouldDecrypt() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let path = write_encrypted_docx(temp_dir.path(), "locked.docx", &["机密", "开会"], "秘密123")?;

    let text = DocumentSource::new().extract(&path, Some("秘密123"))?;
    assert_eq!(text, "机密\n\n开会");
    Ok(())
}

/// Test that no password means PasswordRequired
#[test]
fn test_extract_withoutPassword_shouldRequirePassword() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = write_encrypted_docx(temp_dir.path(), "locked.docx", &["x"], "pw")?;

    let err = DocumentSource::new().extract(&path, None).unwrap_err();
    assert!(err.is_password_required());
    Ok(())
}

/// Test that a wrong password is reported as such
#[test]
fn test_extract_withWrongPassword_shouldFailWithWrongPassword() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = write_encrypted_docx(temp_dir.path(), "locked.docx", &["x"], "pw")?;

    let result = DocumentSource::new().extract(&path, Some("nope"));
    assert!(matches!(result, Err(DocumentError::WrongPassword(_))));
    Ok(())
}

/// Test that the controller asks exactly once and then corrects
#[tokio::test]
async fn test_open_document_withPrompt_shouldAskOnceAndCorrect() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = write_encrypted_docx(temp_dir.path(), "locked.docx", &["这个项目"], "pw")?;
    let prompt = CountingPrompt::new(Some("pw"));

    let controller = common::mock_controller(&[]);
    assert!(controller.open_document(&path, None, &prompt).await?);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert_eq!(controller.text(), "這個項目");
    Ok(())
}

/// Test that a wrong prompted password is not retried
#[tokio::test]
async fn test_open_document_withWrongPromptedPassword_shouldFailOnce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = write_encrypted_docx(temp_dir.path(), "locked.docx", &["x"], "pw")?;
    let prompt = CountingPrompt::new(Some("bad"));

    let controller = common::mock_controller(&[]);
    let result = controller.open_document(&path, None, &prompt).await;

    assert!(matches!(result, Err(AppError::Document(DocumentError::WrongPassword(_)))));
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert!(controller.text().is_empty());
    Ok(())
}

/// Test that cancelling the prompt surfaces PasswordRequired
#[test]
fn test_load_document_withCancelledPrompt_shouldRequirePassword() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = write_encrypted_docx(temp_dir.path(), "locked.docx", &["x"], "pw")?;
    let controller = common::mock_controller(&[]);

    let result = controller.load_document(&path, None, &NoPasswordPrompt);
    assert!(matches!(result, Err(AppError::Document(DocumentError::PasswordRequired(_)))));
    Ok(())
}

/// Descriptor whose password key claims an absurd block size
fn oversized_block_descriptor() -> String {
    let salt = "AAECAwQFBgcICQoLDA0ODw==";
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<encryption xmlns="http://schemas.microsoft.com/office/2006/encryption" "#,
            r#"xmlns:p="http://schemas.microsoft.com/office/2006/keyEncryptor/password">"#,
            r#"<keyData saltSize="16" blockSize="16" keyBits="256" hashSize="64" "#,
            r#"cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" hashAlgorithm="SHA512" "#,
            r#"saltValue="{salt}"/><keyEncryptors><keyEncryptor>"#,
            r#"<p:encryptedKey spinCount="1" saltSize="16" blockSize="18446744073709551615" "#,
            r#"keyBits="256" hashSize="64" cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" "#,
            r#"hashAlgorithm="SHA512" saltValue="{salt}" encryptedVerifierHashInput="{salt}" "#,
            r#"encryptedVerifierHashValue="{salt}" encryptedKeyValue="{salt}"/>"#,
            r#"</keyEncryptor></keyEncryptors></encryption>"#
        ),
        salt = salt
    )
}

/// Test that a crafted descriptor is reported instead of crashing
#[test]
fn test_extract_withOversizedBlockSize_shouldFailWithoutPanic() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let bytes = agile_container(&oversized_block_descriptor(), &[0u8; 24])?;
    let path = common::create_binary_file(temp_dir.path(), "crafted.docx", &bytes)?;

    let result = DocumentSource::new().extract(&path, Some("pw"));
    assert!(matches!(result, Err(DocumentError::UnsupportedEncryption(_))));
    Ok(())
}

/// Test that the controller survives the crafted descriptor too
#[test]
fn test_load_document_withOversizedBlockSize_shouldReportError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let bytes = agile_container(&oversized_block_descriptor(), &[0u8; 24])?;
    let path = common::create_binary_file(temp_dir.path(), "crafted.docx", &bytes)?;
    let controller = common::mock_controller(&[]);
    controller.set_text("舊內容");

    let result = controller.load_document(&path, Some("pw"), &NoPasswordPrompt);
    assert!(matches!(result, Err(AppError::Document(DocumentError::UnsupportedEncryption(_)))));
    assert_eq!(controller.text(), "舊內容");
    Ok(())
}
