use std::sync::OnceLock;

use anyhow::{anyhow, Context};
use base64ct::{Base64, Encoding};
use plotters::{
    prelude::*,
    style::{register_font, FontStyle},
};

const FONT_FAMILY: &str = "sans-serif";
static FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// What to draw: one bar per `(label, count)` in the given order.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, u32)>,
}

/// Encoded PNG image.
#[derive(Debug, Clone)]
pub struct ChartImage {
    bytes: Vec<u8>,
}

impl ChartImage {
    pub fn from_png(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.bytes)
    }
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &BarChart) -> anyhow::Result<ChartImage>;
}

/// Bitmap renderer backed by `plotters`.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    width: u32,
    height: u32,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self::new(800, 480)
    }
}

fn ensure_font() -> anyhow::Result<()> {
    FONT_REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT)
                .map_err(|_| "bundled font could not be parsed".to_string())
        })
        .clone()
        .map_err(|e| anyhow!(e))
}

impl PlottersRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw(&self, chart: &BarChart, buf: &mut [u8]) -> anyhow::Result<()> {
        let root = BitMapBackend::with_buffer(buf, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!(e.to_string()))?;

        let n = chart.bars.len() as u32;
        let top = chart.bars.iter().map(|(_, c)| *c).max().unwrap_or(0) + 1;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT_FAMILY, 28))
            .margin(12)
            .x_label_area_size(48)
            .y_label_area_size(56)
            .build_cartesian_2d((0u32..n.max(1)).into_segmented(), 0u32..top)
            .map_err(|e| anyhow!(e.to_string()))?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .axis_desc_style((FONT_FAMILY, 18))
            .label_style((FONT_FAMILY, 15))
            .x_labels(chart.bars.len().max(1))
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => chart
                    .bars
                    .get(*i as usize)
                    .map(|(label, _)| label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(|e| anyhow!(e.to_string()))?;

        ctx.draw_series(
            Histogram::vertical(&ctx)
                .style(BLUE.mix(0.7).filled())
                .margin(16)
                .data(chart.bars.iter().enumerate().map(|(i, (_, c))| (i as u32, *c))),
        )
        .map_err(|e| anyhow!(e.to_string()))?;

        root.present().map_err(|e| anyhow!(e.to_string()))?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, chart: &BarChart) -> anyhow::Result<ChartImage> {
        ensure_font()?;

        let mut buf = vec![0u8; (self.width * self.height * 3) as usize];
        self.draw(chart, &mut buf)?;

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().context("png header")?;
            writer.write_image_data(&buf).context("png data")?;
            writer.finish().context("png finish")?;
        }
        Ok(ChartImage::from_png(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn chart(bars: Vec<(&str, u32)>) -> BarChart {
        BarChart {
            title: "Gender distribution".into(),
            x_label: "Gender".into(),
            y_label: "Responses".into(),
            bars: bars.into_iter().map(|(l, c)| (l.to_string(), c)).collect(),
        }
    }

    #[test]
    fn renders_png_with_bars() {
        let img = PlottersRenderer::default()
            .render(&chart(vec![("ж", 1), ("м", 2)]))
            .unwrap();
        assert!(img.as_bytes().starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn empty_chart_is_still_a_png() {
        let img = PlottersRenderer::new(320, 200).render(&chart(vec![])).unwrap();
        assert!(img.as_bytes().starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn base64_form_round_trips_signature() {
        let img = ChartImage::from_png(PNG_SIGNATURE.to_vec());
        assert_eq!(img.to_base64(), "iVBORw0KGgo=");
    }
}
