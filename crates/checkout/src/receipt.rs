//! XML receipts for completed purchases.
//!
//! The document layout and element names (`nombre`, `precio`, `cantidad`,
//! `impuestos`) are a fixed file format read by existing consumers of
//! `receipt.xml`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::escape::escape;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use tienda_core::{Product, ProductId};

/// File name the receipt is saved under.
pub const RECEIPT_FILE_NAME: &str = "receipt.xml";

/// MIME type of the receipt.
pub const RECEIPT_MIME_TYPE: &str = "text/xml";

/// Tax rate reported on receipts (16%).
const TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// One purchased line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Rendered as 1 when absent.
    pub quantity: Option<u32>,
}

impl From<&Product> for ReceiptItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: Some(1),
        }
    }
}

/// Environment primitive that saves bytes as a named file.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> io::Result<()>;
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, bytes: &[u8], file_name: &str, _mime_type: &str) -> io::Result<()> {
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), "Receipt saved");
        Ok(())
    }
}

/// Renders receipts and hands them to a [`DownloadSink`].
#[derive(Clone)]
pub struct ReceiptGenerator {
    sink: Arc<dyn DownloadSink>,
}

impl ReceiptGenerator {
    #[must_use]
    pub fn new(sink: Arc<dyn DownloadSink>) -> Self {
        Self { sink }
    }

    /// Render the receipt document.
    #[must_use]
    pub fn render(items: &[ReceiptItem], total: Decimal) -> String {
        let tax = (total * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<receipt>\n  <items>\n");
        for item in items {
            xml.push_str("    <item>\n");
            xml.push_str(&format!("      <nombre>{}</nombre>\n", escape(item.name.as_str())));
            xml.push_str(&format!("      <precio>{}</precio>\n", item.price.normalize()));
            xml.push_str(&format!(
                "      <cantidad>{}</cantidad>\n",
                item.quantity.unwrap_or(1)
            ));
            xml.push_str("    </item>\n");
        }
        xml.push_str(&format!("  </items>\n  <total>{}</total>\n", total.normalize()));
        xml.push_str(&format!("  <impuestos>{tax:.2}</impuestos>\n</receipt>"));
        xml
    }

    /// Render the receipt and save it as `receipt.xml`.
    ///
    /// A failed save is logged and otherwise ignored.
    pub async fn generate(&self, items: &[ReceiptItem], total: Decimal) {
        let document = Self::render(items, total);
        if let Err(e) = self
            .sink
            .save(document.as_bytes(), RECEIPT_FILE_NAME, RECEIPT_MIME_TYPE)
            .await
        {
            warn!(error = %e, "Failed to save receipt");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl DownloadSink for MemorySink {
        async fn save(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> io::Result<()> {
            self.saved.lock().unwrap().push((
                String::from_utf8(bytes.to_vec()).unwrap(),
                file_name.to_string(),
                mime_type.to_string(),
            ));
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl DownloadSink for BrokenSink {
        async fn save(&self, _: &[u8], _: &str, _: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn item(id: i32, name: &str, price: &str, quantity: Option<u32>) -> ReceiptItem {
        ReceiptItem {
            id: ProductId::new(id),
            name: name.to_string(),
            price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_render_empty_receipt() {
        let xml = ReceiptGenerator::render(&[], Decimal::ZERO);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <receipt>\n  <items>\n  </items>\n  <total>0</total>\n  \
             <impuestos>0.00</impuestos>\n</receipt>"
        );
    }

    #[test]
    fn test_render_items() {
        let items = [
            item(1, "Taza", "12.50", Some(1)),
            item(2, "Plato", "30", None),
        ];
        let xml = ReceiptGenerator::render(&items, "42.50".parse().unwrap());

        assert!(xml.contains(
            "    <item>\n      <nombre>Taza</nombre>\n      <precio>12.5</precio>\n      \
             <cantidad>1</cantidad>\n    </item>\n"
        ));
        assert!(xml.contains("<nombre>Plato</nombre>\n      <precio>30</precio>\n      <cantidad>1</cantidad>"));
        assert!(xml.contains("<total>42.5</total>"));
        assert!(xml.contains("<impuestos>6.80</impuestos>"));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let xml = ReceiptGenerator::render(&[], "10.03".parse().unwrap());
        // 10.03 * 0.16 = 1.6048
        assert!(xml.contains("<impuestos>1.60</impuestos>"));
    }

    #[test]
    fn test_name_is_escaped() {
        let xml = ReceiptGenerator::render(
            &[item(1, "<script>&\"'", "1", None)],
            Decimal::ONE,
        );
        assert!(xml.contains("<nombre>&lt;script&gt;&amp;&quot;&apos;</nombre>"));
        assert!(!xml.contains("<script>"));
    }

    #[tokio::test]
    async fn test_generate_saves_receipt_file() {
        let sink = Arc::new(MemorySink::default());
        let generator = ReceiptGenerator::new(Arc::clone(&sink) as Arc<dyn DownloadSink>);

        generator
            .generate(&[item(1, "Taza", "5", Some(2))], Decimal::new(5, 0))
            .await;

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let (content, file_name, mime_type) = &saved[0];
        assert_eq!(file_name, RECEIPT_FILE_NAME);
        assert_eq!(mime_type, RECEIPT_MIME_TYPE);
        assert!(content.contains("<cantidad>2</cantidad>"));
    }

    #[tokio::test]
    async fn test_generate_swallows_sink_failure() {
        let generator = ReceiptGenerator::new(Arc::new(BrokenSink));
        generator.generate(&[], Decimal::ZERO).await;
    }

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        sink.save(b"<receipt/>", RECEIPT_FILE_NAME, RECEIPT_MIME_TYPE)
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join(RECEIPT_FILE_NAME)).unwrap();
        assert_eq!(written, "<receipt/>");
    }
}
