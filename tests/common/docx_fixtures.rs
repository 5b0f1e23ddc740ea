/*!
 * Word document fixtures
 *
 * Builds minimal .docx packages in memory and wraps them in an ECMA-376
 * agile-encrypted compound file, so extraction can be tested without
 * binary resources in the repository.
 */

use anyhow::{Result, anyhow};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha512};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Spin count used by the fixture; real files use 100000
pub const FIXTURE_SPIN_COUNT: u32 = 1000;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// One paragraph with a single run
pub fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

/// A table with one paragraph per cell
pub fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in row.iter() {
            xml.push_str("<w:tc>");
            xml.push_str(&paragraph(cell));
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

fn part(root: &str, inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:{root} xmlns:w="{ns}">{inner}</w:{root}>"#,
        root = root,
        ns = NAMESPACE,
        inner = inner
    )
}

/// Package with the given body blocks and optional header and footer
pub fn build_docx(body: &str, header: Option<&str>, footer: Option<&str>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(part("document", &format!("<w:body>{}</w:body>", body)).as_bytes())?;

    if let Some(header) = header {
        zip.start_file("word/header1.xml", options)?;
        zip.write_all(part("hdr", &paragraph(header)).as_bytes())?;
    }
    if let Some(footer) = footer {
        zip.start_file("word/footer1.xml", options)?;
        zip.write_all(part("ftr", &paragraph(footer)).as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Package whose body is one paragraph per entry
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Result<Vec<u8>> {
    let body: String = paragraphs.iter().map(|p| paragraph(p)).collect();
    build_docx(&body, None, None)
}

/// Write a package with one paragraph per entry into `dir`
pub fn write_docx(dir: &Path, filename: &str, paragraphs: &[&str]) -> Result<PathBuf> {
    let path = dir.join(filename);
    std::fs::write(&path, docx_with_paragraphs(paragraphs)?)?;
    Ok(path)
}

fn sha512(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

fn resized(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
    bytes.resize(len, 0x36);
    bytes
}

fn zero_padded(mut bytes: Vec<u8>) -> Vec<u8> {
    let rem = bytes.len() % 16;
    if rem != 0 {
        bytes.resize(bytes.len() + 16 - rem, 0);
    }
    bytes
}

fn aes256_cbc(key: &[u8], iv: &[u8], plain: &[u8]) -> Result<Vec<u8>> {
    let mut buf = zero_padded(plain.to_vec());
    let len = buf.len();
    cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
        .map_err(|e| anyhow!("bad key or iv: {:?}", e))?
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|e| anyhow!("encryption failed: {:?}", e))?;
    Ok(buf)
}

/// Encrypt a package with agile encryption (SHA-512, AES-256-CBC)
pub fn encrypt_agile(package: &[u8], password: &str) -> Result<Vec<u8>> {
    let key_salt: Vec<u8> = (1..=16).collect();
    let password_salt: Vec<u8> = (101..=116).collect();
    let secret: Vec<u8> = (0..32).map(|i| (i * 7 + 3) as u8).collect();
    let verifier: Vec<u8> = (0..16).map(|i| (200 - i) as u8).collect();

    let utf16: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let mut hashed = sha512(&[password_salt.as_slice(), utf16.as_slice()]);
    for round in 0..FIXTURE_SPIN_COUNT {
        hashed = sha512(&[&round.to_le_bytes()[..], hashed.as_slice()]);
    }
    let derive = |block: &[u8]| resized(sha512(&[hashed.as_slice(), block]), 32);

    let iv = password_salt.clone();
    let enc_verifier_input = aes256_cbc(
        &derive(&[0xfe, 0xa7, 0xd2, 0x76, 0x3b, 0x4b, 0x9e, 0x79]),
        &iv,
        &verifier,
    )?;
    let enc_verifier_value = aes256_cbc(
        &derive(&[0xd7, 0xaa, 0x0f, 0x6d, 0x30, 0x61, 0x34, 0x4e]),
        &iv,
        &sha512(&[verifier.as_slice()]),
    )?;
    let enc_key_value = aes256_cbc(
        &derive(&[0x14, 0x6e, 0x0b, 0xe7, 0xab, 0xac, 0xd0, 0xd6]),
        &iv,
        &secret,
    )?;

    let mut encrypted_package = (package.len() as u64).to_le_bytes().to_vec();
    for (index, segment) in package.chunks(4096).enumerate() {
        let segment_iv = resized(sha512(&[key_salt.as_slice(), &(index as u32).to_le_bytes()[..]]), 16);
        encrypted_package.extend(aes256_cbc(&secret, &segment_iv, segment)?);
    }

    let xml = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<encryption xmlns="http://schemas.microsoft.com/office/2006/encryption" "#,
            r#"xmlns:p="http://schemas.microsoft.com/office/2006/keyEncryptor/password">"#,
            r#"<keyData saltSize="16" blockSize="16" keyBits="256" hashSize="64" "#,
            r#"cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" hashAlgorithm="SHA512" "#,
            r#"saltValue="{key_salt}"/>"#,
            r#"<keyEncryptors><keyEncryptor uri="http://schemas.microsoft.com/office/2006/keyEncryptor/password">"#,
            r#"<p:encryptedKey spinCount="{spin}" saltSize="16" blockSize="16" keyBits="256" "#,
            r#"hashSize="64" cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" "#,
            r#"hashAlgorithm="SHA512" saltValue="{password_salt}" "#,
            r#"encryptedVerifierHashInput="{input}" encryptedVerifierHashValue="{value}" "#,
            r#"encryptedKeyValue="{key}"/></keyEncryptor></keyEncryptors></encryption>"#
        ),
        key_salt = BASE64.encode(&key_salt),
        spin = FIXTURE_SPIN_COUNT,
        password_salt = BASE64.encode(&password_salt),
        input = BASE64.encode(&enc_verifier_input),
        value = BASE64.encode(&enc_verifier_value),
        key = BASE64.encode(&enc_key_value),
    );

    agile_container(&xml, &encrypted_package)
}

/// Compound file with a version 4.4 `EncryptionInfo` holding `descriptor`
/// and the given `EncryptedPackage` stream
pub fn agile_container(descriptor: &str, encrypted_package: &[u8]) -> Result<Vec<u8>> {
    let mut info = Vec::new();
    info.extend_from_slice(&4u16.to_le_bytes());
    info.extend_from_slice(&4u16.to_le_bytes());
    info.extend_from_slice(&0x40u32.to_le_bytes());
    info.extend_from_slice(descriptor.as_bytes());

    let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new()))?;
    {
        let mut stream = compound.create_stream("/EncryptionInfo")?;
        stream.write_all(&info)?;
    }
    {
        let mut stream = compound.create_stream("/EncryptedPackage")?;
        stream.write_all(encrypted_package)?;
    }
    compound.flush()?;
    Ok(compound.into_inner().into_inner())
}

/// Write an encrypted package with one paragraph per entry into `dir`
pub fn write_encrypted_docx(
    dir: &Path,
    filename: &str,
    paragraphs: &[&str],
    password: &str,
) -> Result<PathBuf> {
    let path = dir.join(filename);
    let package = docx_with_paragraphs(paragraphs)?;
    std::fs::write(&path, encrypt_agile(&package, password)?)?;
    Ok(path)
}
