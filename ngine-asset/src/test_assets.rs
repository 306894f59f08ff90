// Asset types shared by the unit tests of this crate

use std::io::{Read, Write};
use std::sync::Arc;

use ngine_base::Name;

use crate::stream::PackageWriter;
use crate::{
    Asset, AssetLocation, AssetReader, AssetResult, AssetWriter, NamedAsset, ObjectDeserializer,
};

// Raw payload bytes
#[derive(Default)]
pub struct BytesAsset {
    pub location: AssetLocation,
    pub bytes: Vec<u8>,
}

impl Asset for BytesAsset {
    fn on_load(
        &mut self,
        reader: &mut AssetReader<'_>,
    ) -> AssetResult<()> {
        reader.read_to_end(&mut self.bytes)?;
        Ok(())
    }

    fn on_save(
        &self,
        writer: &mut AssetWriter<'_>,
    ) -> AssetResult<()> {
        writer.write_all(&self.bytes)?;
        Ok(())
    }

    fn location(&self) -> &AssetLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut AssetLocation {
        &mut self.location
    }
}

impl NamedAsset for BytesAsset {
    const TYPE_NAME: &'static str = "ng.bytes";
}

// A bincode string
#[derive(Default)]
pub struct TextAsset {
    pub location: AssetLocation,
    pub text: String,
}

impl Asset for TextAsset {
    fn on_load(
        &mut self,
        reader: &mut AssetReader<'_>,
    ) -> AssetResult<()> {
        self.text = reader.read_bincode()?;
        Ok(())
    }

    fn on_save(
        &self,
        writer: &mut AssetWriter<'_>,
    ) -> AssetResult<()> {
        writer.write_bincode(&self.text)
    }

    fn location(&self) -> &AssetLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut AssetLocation {
        &mut self.location
    }
}

impl NamedAsset for TextAsset {
    const TYPE_NAME: &'static str = "ng.text";
}

// A label and an optional reference to another asset
#[derive(Default)]
pub struct LinkAsset {
    pub location: AssetLocation,
    pub label: String,
    pub target: Option<Arc<dyn Asset>>,
}

impl LinkAsset {
    // Payload of a link whose target is given by path, for packages that cannot be built from
    // loaded assets (for example cycles)
    pub fn payload(
        label: &str,
        target_path: &str,
    ) -> Vec<u8> {
        let mut bytes = bincode::serialize(label).unwrap();
        PackageWriter::new(&mut bytes)
            .write_string(target_path)
            .unwrap();
        bytes
    }
}

impl Asset for LinkAsset {
    fn on_load(
        &mut self,
        reader: &mut AssetReader<'_>,
    ) -> AssetResult<()> {
        self.label = reader.read_bincode()?;
        self.target = reader.read_asset_ref()?;
        Ok(())
    }

    fn on_save(
        &self,
        writer: &mut AssetWriter<'_>,
    ) -> AssetResult<()> {
        writer.write_bincode(&self.label)?;
        writer.write_asset_ref(self.target.as_deref())
    }

    fn location(&self) -> &AssetLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut AssetLocation {
        &mut self.location
    }
}

impl NamedAsset for LinkAsset {
    const TYPE_NAME: &'static str = "ng.link";
}

// Version 0 stored a u32 counter, version 1 widened it to u64
#[derive(Default)]
pub struct CounterAsset {
    pub location: AssetLocation,
    pub count: u64,
}

impl Asset for CounterAsset {
    fn on_load(
        &mut self,
        reader: &mut AssetReader<'_>,
    ) -> AssetResult<()> {
        self.count = match reader.version() {
            0 => reader.read_bincode::<u32>()? as u64,
            _ => reader.read_bincode::<u64>()?,
        };
        Ok(())
    }

    fn on_save(
        &self,
        writer: &mut AssetWriter<'_>,
    ) -> AssetResult<()> {
        writer.set_version(1);
        writer.write_bincode(&self.count)
    }

    fn location(&self) -> &AssetLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut AssetLocation {
        &mut self.location
    }
}

impl NamedAsset for CounterAsset {
    const TYPE_NAME: &'static str = "ng.counter";
}

// Read from a JSON object archive
#[derive(Default)]
pub struct SettingsAsset {
    pub location: AssetLocation,
    pub title: String,
    pub volume: u8,
    pub layers: Vec<String>,
}

impl Asset for SettingsAsset {
    fn on_load(
        &mut self,
        reader: &mut AssetReader<'_>,
    ) -> AssetResult<()> {
        let mut archive = reader.object_deserializer()?;
        self.title = archive
            .deserialize_string(&Name::new("title"), "")
            .unwrap_or_default();
        self.volume = archive
            .deserialize_u8(&Name::new("volume"), 0)
            .unwrap_or(100);

        if archive.begin_array(&Name::new("layers")) {
            for i in 0..archive.len() {
                archive.set_index(i);
                if let Some(layer) = archive.deserialize_string(&Name::none(), "") {
                    self.layers.push(layer);
                }
            }
        }
        archive.end_array();
        Ok(())
    }

    fn on_save(
        &self,
        _writer: &mut AssetWriter<'_>,
    ) -> AssetResult<()> {
        Err("settings are authored as json".into())
    }

    fn location(&self) -> &AssetLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut AssetLocation {
        &mut self.location
    }
}

impl NamedAsset for SettingsAsset {
    const TYPE_NAME: &'static str = "ng.settings";
}
