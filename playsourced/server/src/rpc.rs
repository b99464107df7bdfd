pub(crate) mod v1 {
    tonic::include_proto!("playsource.v1");
}

pub(crate) const FILE_DESCRIPTOR_SET: &[u8] =
    tonic::include_file_descriptor_set!("playsource_descriptor");
