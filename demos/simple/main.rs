use flowlet::{ChannelEvent, ChannelOptions, EngineBuilder, WorkflowModel};

fn main() {
    let engine = EngineBuilder::new().build().unwrap();

    engine.launch();

    let text = include_str!("./workflow.json");

    let workflow_model = WorkflowModel::from_json(text).unwrap();

    engine.deploy(&workflow_model).unwrap();
    engine.activate(&workflow_model.id).unwrap();

    ChannelEvent::channel(engine.channel(), ChannelOptions::default()).on_log(|log| {
        println!("[{}] {}", log.nid, log.content);
    });

    ChannelEvent::channel(engine.channel(), ChannelOptions::default()).on_complete(|rid| {
        println!("Run completed, id: {}", rid);
    });

    ChannelEvent::channel(engine.channel(), ChannelOptions::default()).on_error(|e| {
        println!("Run failed: {:?}", e.event);
    });

    let run = engine.start_run(&workflow_model.id, "user_demo").unwrap();

    loop {
        if run.is_complete() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    let outputs: serde_json::Value = run.outputs().into();
    println!("Outputs: {:#?}", outputs);

    let record = engine.store().runs().find(run.id()).unwrap();
    println!("Run state: {}, duration: {}s", record.state, record.duration);
}
