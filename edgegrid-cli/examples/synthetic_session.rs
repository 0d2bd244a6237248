use edgegrid_cli::replay::{replay_all, PointerEvent, StrokeScript};
use edgegrid_cli::{AnnotationSession, CommitPipeline, DatasetWriter, InMemoryImageSource, LabelFormat};
use edgegrid_core::Grid;
use edgegrid_spectral::ExtractorBuilder;
use image::{DynamicImage, Rgb, RgbImage};
use std::time::Instant;

/// Dark background with a bright diagonal band
fn synthetic_image(size: u32, offset: i64) -> DynamicImage {
    let img = RgbImage::from_fn(size, size, |x, y| {
        let d = (x as i64 - y as i64 - offset).abs();
        if d < 6 {
            Rgb([230, 220, 200])
        } else {
            let n = ((x * 7 + y * 13) % 23) as u8;
            Rgb([20 + n, 25 + n, 30 + n])
        }
    });
    DynamicImage::ImageRgb8(img)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧭 edgegrid synthetic annotation session");
    println!("========================================\n");

    let grid = Grid::reference();
    let size = grid.canvas_size() as u32;
    let builder = ExtractorBuilder::new(grid).threads(4);
    println!("⚙️  {}", builder.summary());

    let source = InMemoryImageSource::new(grid.canvas_size())
        .with_image("diag_0", synthetic_image(size, 0))
        .with_image("diag_120", synthetic_image(size, 120))
        .with_image("blank", synthetic_image(size, 10_000));

    // trace each band along its centre line, in a few drags
    let mut script = StrokeScript::default();
    for (id, offset) in [("diag_0", 0), ("diag_120", 120)] {
        let mut events = vec![PointerEvent::Begin { x: offset, y: 0 }];
        for step in 1..=6 {
            let y = step * 100;
            events.push(PointerEvent::Extend { x: (y + offset).min(749), y });
        }
        events.push(PointerEvent::End);
        script.images.insert(id.to_string(), events);
    }

    let out_dir = std::env::temp_dir().join("edgegrid_synthetic");
    let writer = DatasetWriter::new(&out_dir, LabelFormat::Text)?;
    let pipeline = CommitPipeline::new(grid, builder.to_config())?;
    let mut session = AnnotationSession::new(source, writer, pipeline);

    let t0 = Instant::now();
    let previews = out_dir.join("previews");
    let reports = replay_all(&mut session, &script, Some(previews.as_path()))?;
    let elapsed = t0.elapsed();

    println!("\n📊 Results:");
    for r in &reports {
        println!(
            "  {:>9}: {:>2} segments, {:>3} marked cells -> {}",
            r.id,
            r.segments,
            r.marked_cells,
            r.record.label_path.display()
        );
    }
    println!("\n⏱️  {} images in {:.2?}", reports.len(), elapsed);
    println!("💾 Dataset written to {}", out_dir.display());

    Ok(())
}
