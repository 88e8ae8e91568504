use dotenv::dotenv;
use el_reenvio::cleaner::CleanJob;
use el_reenvio::cleaner::JOB_TYPE;
use el_reenvio::db;
use el_reenvio::Config;
use fang::Queue;
use fang::Queueable;
use fang::WorkerPool;

fn main() {
    dotenv().ok();
    env_logger::init();

    let queue = Queue::builder().connection_pool(db::pool().clone()).build();

    queue.schedule_task(&CleanJob::new()).unwrap();

    let mut worker_pool = WorkerPool::<Queue>::builder()
        .queue(queue)
        .number_of_workers(Config::clean_workers_number())
        .task_type(JOB_TYPE.to_string())
        .build();

    worker_pool.start().unwrap();

    log::info!("Started the retention worker pool");

    std::thread::park();
}
